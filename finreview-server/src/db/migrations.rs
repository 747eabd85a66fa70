//! Schema creation for the review workflow tables
//!
//! Every statement is idempotent (`IF NOT EXISTS`), so running on each
//! server start is safe.

use sqlx::PgPool;

use super::DbError;

/// Tables first, in foreign-key order, then indexes.
const STATEMENTS: &[(&str, &str)] = &[
    (
        "entities",
        r#"
        CREATE TABLE IF NOT EXISTS entities (
            id BIGSERIAL PRIMARY KEY,
            name TEXT NOT NULL,
            code TEXT NOT NULL,
            department TEXT NOT NULL,
            region TEXT NOT NULL,
            status TEXT NOT NULL DEFAULT 'active',
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            CONSTRAINT entities_code_key UNIQUE (code)
        )
        "#,
    ),
    (
        "stakeholders",
        r#"
        CREATE TABLE IF NOT EXISTS stakeholders (
            id BIGSERIAL PRIMARY KEY,
            name TEXT NOT NULL,
            email TEXT NOT NULL,
            role TEXT NOT NULL,
            department TEXT NOT NULL,
            entities JSONB NOT NULL DEFAULT '[]'::jsonb,
            notification_preferences JSONB NOT NULL DEFAULT '{"email": true, "inApp": true}'::jsonb,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            CONSTRAINT stakeholders_email_key UNIQUE (email)
        )
        "#,
    ),
    (
        "gl_accounts",
        r#"
        CREATE TABLE IF NOT EXISTS gl_accounts (
            id BIGSERIAL PRIMARY KEY,
            entity_id BIGINT NOT NULL,
            account_number TEXT NOT NULL,
            account_name TEXT NOT NULL,
            account_type TEXT NOT NULL,
            current_balance DOUBLE PRECISION NOT NULL DEFAULT 0,
            previous_balance DOUBLE PRECISION NOT NULL DEFAULT 0,
            opening_balance DOUBLE PRECISION NOT NULL DEFAULT 0,
            currency TEXT NOT NULL DEFAULT 'USD',
            last_updated TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            CONSTRAINT gl_accounts_entity_id_fkey FOREIGN KEY (entity_id)
                REFERENCES entities(id) ON DELETE CASCADE
        )
        "#,
    ),
    (
        "trial_reports",
        r#"
        CREATE TABLE IF NOT EXISTS trial_reports (
            id BIGSERIAL PRIMARY KEY,
            entity_id BIGINT NOT NULL,
            reporting_period TEXT NOT NULL,
            report_type TEXT NOT NULL,
            status TEXT NOT NULL DEFAULT 'pending',
            total_debits DOUBLE PRECISION NOT NULL DEFAULT 0,
            total_credits DOUBLE PRECISION NOT NULL DEFAULT 0,
            balance_difference DOUBLE PRECISION NOT NULL DEFAULT 0,
            uploaded_by BIGINT,
            uploaded_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            reviewed_by BIGINT,
            reviewed_at TIMESTAMPTZ,
            file_url TEXT,
            CONSTRAINT trial_reports_entity_id_fkey FOREIGN KEY (entity_id)
                REFERENCES entities(id) ON DELETE CASCADE,
            CONSTRAINT trial_reports_uploaded_by_fkey FOREIGN KEY (uploaded_by)
                REFERENCES stakeholders(id) ON DELETE SET NULL,
            CONSTRAINT trial_reports_reviewed_by_fkey FOREIGN KEY (reviewed_by)
                REFERENCES stakeholders(id) ON DELETE SET NULL
        )
        "#,
    ),
    (
        "assignments",
        r#"
        CREATE TABLE IF NOT EXISTS assignments (
            id BIGSERIAL PRIMARY KEY,
            entity_id BIGINT NOT NULL,
            stakeholder_id BIGINT NOT NULL,
            role_type TEXT NOT NULL,
            due_date DATE NOT NULL,
            status TEXT NOT NULL DEFAULT 'pending',
            assigned_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            completed_at TIMESTAMPTZ,
            CONSTRAINT assignments_entity_id_fkey FOREIGN KEY (entity_id)
                REFERENCES entities(id) ON DELETE CASCADE,
            CONSTRAINT assignments_stakeholder_id_fkey FOREIGN KEY (stakeholder_id)
                REFERENCES stakeholders(id) ON DELETE CASCADE
        )
        "#,
    ),
    (
        "notifications",
        r#"
        CREATE TABLE IF NOT EXISTS notifications (
            id BIGSERIAL PRIMARY KEY,
            stakeholder_id BIGINT NOT NULL,
            message TEXT NOT NULL,
            type TEXT NOT NULL,
            read_status BOOLEAN NOT NULL DEFAULT FALSE,
            sent_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            related_entity_id BIGINT,
            related_report_id BIGINT,
            CONSTRAINT notifications_stakeholder_id_fkey FOREIGN KEY (stakeholder_id)
                REFERENCES stakeholders(id) ON DELETE CASCADE
        )
        "#,
    ),
    (
        "variance_analysis",
        r#"
        CREATE TABLE IF NOT EXISTS variance_analysis (
            id BIGSERIAL PRIMARY KEY,
            trial_report_id BIGINT NOT NULL,
            gl_account_id BIGINT NOT NULL,
            variance_amount DOUBLE PRECISION NOT NULL,
            variance_percentage DOUBLE PRECISION NOT NULL,
            period_comparison TEXT NOT NULL,
            anomaly_detected BOOLEAN NOT NULL DEFAULT FALSE,
            anomaly_reason TEXT,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            CONSTRAINT variance_analysis_trial_report_id_fkey FOREIGN KEY (trial_report_id)
                REFERENCES trial_reports(id) ON DELETE CASCADE,
            CONSTRAINT variance_analysis_gl_account_id_fkey FOREIGN KEY (gl_account_id)
                REFERENCES gl_accounts(id) ON DELETE CASCADE
        )
        "#,
    ),
    (
        "audit_logs",
        r#"
        CREATE TABLE IF NOT EXISTS audit_logs (
            id BIGSERIAL PRIMARY KEY,
            user_id BIGINT NOT NULL,
            action TEXT NOT NULL,
            entity_type TEXT NOT NULL,
            entity_id BIGINT NOT NULL,
            old_value JSONB,
            new_value JSONB,
            ip_address TEXT,
            timestamp TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
    ),
    (
        "indexes",
        r#"
        CREATE INDEX IF NOT EXISTS idx_gl_accounts_entity ON gl_accounts(entity_id);
        CREATE INDEX IF NOT EXISTS idx_trial_reports_entity ON trial_reports(entity_id);
        CREATE INDEX IF NOT EXISTS idx_trial_reports_status ON trial_reports(status);
        CREATE INDEX IF NOT EXISTS idx_assignments_stakeholder ON assignments(stakeholder_id);
        CREATE INDEX IF NOT EXISTS idx_notifications_stakeholder ON notifications(stakeholder_id, read_status);
        CREATE INDEX IF NOT EXISTS idx_variance_report ON variance_analysis(trial_report_id);
        CREATE INDEX IF NOT EXISTS idx_audit_logs_target ON audit_logs(entity_type, entity_id);
        "#,
    ),
];

/// Run all schema statements
pub async fn run(pool: &PgPool) -> Result<(), DbError> {
    tracing::info!("Running finreview migrations...");

    for (name, sql) in STATEMENTS {
        // raw_sql allows the multi-statement index block
        sqlx::raw_sql(sql).execute(pool).await?;
        tracing::debug!(step = name, "migration step applied");
    }

    tracing::info!(steps = STATEMENTS.len(), "Migrations complete");
    Ok(())
}
