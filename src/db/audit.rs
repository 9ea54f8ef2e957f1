use sqlx::PgPool;

use crate::audit::AuditEvent;
use crate::models::AuditRecord;

/// Append one row to the audit trail. `recorded_at` is assigned by the
/// database; rows are never updated or deleted from application code.
pub async fn insert(pool: &PgPool, event: &AuditEvent) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO audit_log (actor_type, actor_id, actor_name, subject_id, module,
                                action_type, outcome, old_value, new_value, source_page,
                                ip_address, user_agent, session_id)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)",
    )
    .bind(event.actor_type.as_str())
    .bind(&event.actor_id)
    .bind(&event.actor_name)
    .bind(&event.subject_id)
    .bind(event.module.as_str())
    .bind(&event.action_type)
    .bind(event.outcome.as_str())
    .bind(&event.old_value)
    .bind(&event.new_value)
    .bind(&event.source_page)
    .bind(&event.ip_address)
    .bind(&event.user_agent)
    .bind(&event.session_id)
    .execute(pool)
    .await?;
    Ok(())
}

/// Paginated trail listing for the admin view, newest first, optionally
/// filtered by module and/or actor.
pub async fn list(
    pool: &PgPool,
    module: Option<&str>,
    actor_id: Option<&str>,
    limit: i64,
    offset: i64,
) -> Result<Vec<AuditRecord>, sqlx::Error> {
    sqlx::query_as::<_, AuditRecord>(
        "SELECT * FROM audit_log
         WHERE ($1::text IS NULL OR module = $1)
           AND ($2::text IS NULL OR actor_id = $2)
         ORDER BY recorded_at DESC LIMIT $3 OFFSET $4",
    )
    .bind(module)
    .bind(actor_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await
}
