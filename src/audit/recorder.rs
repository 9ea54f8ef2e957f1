use std::sync::Arc;

use super::meta::RequestMeta;
use super::record::{ActorType, AuditEvent, AuditModule, Outcome};
use super::store::AuditStore;

/// Normalizes domain events into canonical audit records and hands them to
/// the store. Fire-and-forget: a failed insert is logged and swallowed so the
/// business operation that triggered it is never affected. Stateless; every
/// call builds its own record and submits independently.
#[derive(Clone)]
pub struct AuditRecorder {
    store: Arc<dyn AuditStore>,
}

impl AuditRecorder {
    pub fn new(store: Arc<dyn AuditStore>) -> Self {
        Self { store }
    }

    /// Generic primitive. Applies defaults, performs exactly one insert, and
    /// never propagates store failures to the caller.
    pub async fn record(&self, event: AuditEvent) {
        let event = event.finalize();
        if let Err(e) = self.store.insert(&event).await {
            tracing::error!(
                module = event.module.as_str(),
                action = %event.action_type,
                "Failed to record audit event: {e}"
            );
        }
    }

    /// Login/logout events.
    pub async fn auth_event(
        &self,
        actor_type: ActorType,
        actor_id: &str,
        actor_name: &str,
        action: &str,
        meta: &RequestMeta,
    ) {
        self.record(
            AuditEvent::new(actor_type, actor_id, actor_name)
                .module(AuditModule::Credentials)
                .action(action)
                .meta(meta),
        )
        .await;
    }

    /// Credential lifecycle beyond plain login/logout: password resets,
    /// rejected login attempts. `subject_id` is the account acted on, which
    /// may differ from the actor (admin resetting a member password) or be
    /// unknown (failed login against a nonexistent email).
    #[allow(clippy::too_many_arguments)]
    pub async fn credential_event(
        &self,
        actor_type: ActorType,
        actor_id: &str,
        actor_name: &str,
        subject_id: Option<&str>,
        action: &str,
        description: &str,
        outcome: Outcome,
        meta: &RequestMeta,
    ) {
        let mut event = AuditEvent::new(actor_type, actor_id, actor_name)
            .module(AuditModule::Credentials)
            .action(action)
            .outcome(outcome)
            .new_value(description)
            .meta(meta);
        if let Some(subject) = subject_id {
            event = event.subject(subject);
        }
        self.record(event).await;
    }

    /// Edits to a patient's data in a caller-chosen module, with serialized
    /// before/after state.
    #[allow(clippy::too_many_arguments)]
    pub async fn patient_data_change(
        &self,
        actor_type: ActorType,
        actor_id: &str,
        actor_name: &str,
        module: AuditModule,
        patient_id: &str,
        action: &str,
        old_value: Option<&str>,
        new_value: Option<&str>,
        meta: &RequestMeta,
    ) {
        let mut event = AuditEvent::new(actor_type, actor_id, actor_name)
            .module(module)
            .action(action)
            .subject(patient_id)
            .meta(meta);
        if let Some(old) = old_value {
            event = event.old_value(old);
        }
        if let Some(new) = new_value {
            event = event.new_value(new);
        }
        self.record(event).await;
    }

    /// Administrative/system actions described by free text.
    #[allow(clippy::too_many_arguments)]
    pub async fn system_action(
        &self,
        actor_type: ActorType,
        actor_id: &str,
        actor_name: &str,
        module: AuditModule,
        action: &str,
        description: &str,
        meta: &RequestMeta,
    ) {
        self.record(
            AuditEvent::new(actor_type, actor_id, actor_name)
                .module(module)
                .action(action)
                .new_value(description)
                .meta(meta),
        )
        .await;
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn medication_change(
        &self,
        actor_type: ActorType,
        actor_id: &str,
        actor_name: &str,
        patient_id: &str,
        action: &str,
        old_medication: Option<&str>,
        new_medication: Option<&str>,
        meta: &RequestMeta,
    ) {
        self.patient_data_change(
            actor_type,
            actor_id,
            actor_name,
            AuditModule::Medications,
            patient_id,
            action,
            old_medication,
            new_medication,
            meta,
        )
        .await;
    }

    /// Health-metrics submissions. The payload is serialized into `new_value`
    /// so the record round-trips back to the original object.
    #[allow(clippy::too_many_arguments)]
    pub async fn metrics_submission(
        &self,
        actor_type: ActorType,
        actor_id: &str,
        actor_name: &str,
        patient_id: &str,
        action: &str,
        payload: &serde_json::Value,
        meta: &RequestMeta,
    ) {
        self.record(
            AuditEvent::new(actor_type, actor_id, actor_name)
                .module(AuditModule::Metrics)
                .action(action)
                .subject(patient_id)
                .new_value(payload.to_string())
                .meta(meta),
        )
        .await;
    }

    /// Appointment lifecycle: schedule, reschedule, cancel.
    #[allow(clippy::too_many_arguments)]
    pub async fn appointment_event(
        &self,
        actor_type: ActorType,
        actor_id: &str,
        actor_name: &str,
        patient_id: &str,
        action: &str,
        detail: &str,
        meta: &RequestMeta,
    ) {
        self.record(
            AuditEvent::new(actor_type, actor_id, actor_name)
                .module(AuditModule::Appointments)
                .action(action)
                .subject(patient_id)
                .new_value(detail)
                .meta(meta),
        )
        .await;
    }

    /// Lab-result lifecycle: upload, update, delete.
    #[allow(clippy::too_many_arguments)]
    pub async fn lab_result_event(
        &self,
        actor_type: ActorType,
        actor_id: &str,
        actor_name: &str,
        patient_id: &str,
        action: &str,
        payload: &serde_json::Value,
        meta: &RequestMeta,
    ) {
        self.record(
            AuditEvent::new(actor_type, actor_id, actor_name)
                .module(AuditModule::LabResults)
                .action(action)
                .subject(patient_id)
                .new_value(payload.to_string())
                .meta(meta),
        )
        .await;
    }

    /// Risk-model configuration changes.
    #[allow(clippy::too_many_arguments)]
    pub async fn ml_settings_change(
        &self,
        actor_type: ActorType,
        actor_id: &str,
        actor_name: &str,
        action: &str,
        old_settings: &serde_json::Value,
        new_settings: &serde_json::Value,
        meta: &RequestMeta,
    ) {
        self.record(
            AuditEvent::new(actor_type, actor_id, actor_name)
                .module(AuditModule::MlSettings)
                .action(action)
                .old_value(old_settings.to_string())
                .new_value(new_settings.to_string())
                .meta(meta),
        )
        .await;
    }
}
