//! Patient Tests
//!
//! Registration, resolution by patient number and contact updates.

#[cfg(test)]
mod tests {
    use crate::fault::{Fault, Op};
    use crate::fixtures::{jane_doe, john_roe, Clinic};
    use async_trait::async_trait;
    use chrono::{Datelike, Utc};
    use hms_shared::{
        ErrorKind, HmsError, InMemoryStore, Query, RecordKey, RecordStore, RegistrationSettings,
        Row, StoreClient, StoreError, Table,
    };
    use patient::{resolve_patient, update_contact_info};
    use patient_integrity::{ContactUpdate, PatientNumber};
    use proptest::prelude::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test]
    async fn test_register_then_resolve_round_trip() {
        let clinic = Clinic::new();
        let before = Utc::now();

        let number = clinic
            .ctx
            .reception()
            .register(jane_doe())
            .await
            .unwrap();
        let patient = resolve_patient(&clinic.ctx.store, number.as_str())
            .await
            .unwrap()
            .unwrap();

        assert_eq!(patient.patient_number, number);
        assert_eq!(patient.full_name, "Jane Doe");
        assert_eq!(patient.date_of_birth.to_string(), "1990-01-01");
        assert_eq!(patient.gender.to_string(), "female");
        assert_eq!(patient.contact_number, "555-0100");
        assert_eq!(patient.address, "1 Main St");
        assert!(patient.created_at >= before - chrono::Duration::seconds(1));
        assert!(patient.created_at <= Utc::now());
        assert_eq!(number.year(), Some(Utc::now().year()));
    }

    #[tokio::test]
    async fn test_resolve_returns_exactly_the_trimmed_number() {
        let clinic = Clinic::new();
        let jane = clinic.patient(jane_doe(), 1).await;
        let john = clinic.patient(john_roe(), 2).await;

        for p in [&jane, &john] {
            let padded = format!("\t {} \n", p.patient_number);
            let resolved = resolve_patient(&clinic.ctx.store, &padded)
                .await
                .unwrap()
                .unwrap();
            assert_eq!(resolved.patient_number.as_str(), padded.trim());
            assert_eq!(resolved.id, p.id);
        }
    }

    #[tokio::test]
    async fn test_empty_number_issues_no_query() {
        let clinic = Clinic::new();
        let err = resolve_patient(&clinic.ctx.store, "   ").await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(clinic.backend.count(Table::Patients, Op::Select), 0);
    }

    #[tokio::test]
    async fn test_not_found_differs_from_transport() {
        let clinic = Clinic::new();
        let portal = clinic.ctx.portal();

        let missing = portal.search_patient("HMS-2025-00404").await.unwrap_err();
        assert_eq!(missing.kind(), ErrorKind::NotFound);

        clinic.backend.inject(
            Table::Patients,
            Op::Select,
            Fault::Fail(StoreError::Unavailable("connection refused".to_string())),
        );
        let down = portal.search_patient("HMS-2025-00404").await.unwrap_err();
        assert_eq!(down.kind(), ErrorKind::Transport);

        assert_ne!(missing.user_message(), down.user_message());
    }

    /// Store without the uniqueness constraint: every patient row comes back twice
    struct Duplicating(InMemoryStore);

    #[async_trait]
    impl RecordStore for Duplicating {
        async fn select(&self, table: Table, query: Query) -> Result<Vec<Row>, StoreError> {
            let rows = self.0.select(table, query).await?;
            Ok(rows.iter().chain(rows.iter()).cloned().collect())
        }

        async fn insert(&self, table: Table, row: Row) -> Result<Row, StoreError> {
            self.0.insert(table, row).await
        }

        async fn update(&self, table: Table, key: &RecordKey, patch: Row) -> Result<Row, StoreError> {
            self.0.update(table, key, patch).await
        }
    }

    #[tokio::test]
    async fn test_duplicate_rows_are_not_not_found() {
        let store = StoreClient::with_timeout(
            Arc::new(Duplicating(InMemoryStore::new())),
            Duration::from_secs(5),
        );
        let jane = patient::register_patient(
            &store,
            &RegistrationSettings::default(),
            jane_doe(),
            &mut StdRng::seed_from_u64(1),
        )
        .await
        .unwrap();

        let err = resolve_patient(&store, jane.patient_number.as_str())
            .await
            .unwrap_err();
        assert_eq!(err, HmsError::DuplicateIdentifier(jane.patient_number.to_string()));
        assert_ne!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_registration_retries_after_collision() {
        let clinic = Clinic::new();
        let first = clinic.patient(jane_doe(), 99).await;

        // Same seed draws the same first number, forcing a collision
        let second = patient::register_patient(
            &clinic.ctx.store,
            &clinic.ctx.config.registration,
            john_roe(),
            &mut StdRng::seed_from_u64(99),
        )
        .await
        .unwrap();

        assert_ne!(first.patient_number, second.patient_number);
        assert_eq!(clinic.backend.count(Table::Patients, Op::Insert), 3);
    }

    #[tokio::test]
    async fn test_registration_exhaustion_is_conflict() {
        let clinic = Clinic::new();
        clinic.backend.inject(
            Table::Patients,
            Op::Insert,
            Fault::Fail(StoreError::UniqueViolation {
                table: Table::Patients,
                column: "patient_number".to_string(),
            }),
        );

        let err = clinic.ctx.reception().register(jane_doe()).await.unwrap_err();
        assert_eq!(err, HmsError::IdentifierSpaceExhausted { attempts: 5 });
        assert_eq!(clinic.backend.count(Table::Patients, Op::Insert), 5);
    }

    #[tokio::test]
    async fn test_update_changes_only_address() {
        let clinic = Clinic::new();
        let jane = clinic.patient(jane_doe(), 1).await;

        update_contact_info(
            &clinic.ctx.store,
            &jane.id,
            ContactUpdate {
                address: Some("2 Oak Ave".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let resolved = resolve_patient(&clinic.ctx.store, jane.patient_number.as_str())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(resolved.address, "2 Oak Ave");
        assert_eq!(resolved.full_name, jane.full_name);
        assert_eq!(resolved.contact_number, jane.contact_number);
        assert_eq!(resolved.date_of_birth, jane.date_of_birth);
        assert_eq!(resolved.gender, jane.gender);
    }

    #[tokio::test]
    async fn test_last_write_wins() {
        let clinic = Clinic::new();
        let jane = clinic.patient(jane_doe(), 1).await;

        let reception_view = jane.clone();
        for address in ["2 Oak Ave", "3 Pine Ct"] {
            update_contact_info(
                &clinic.ctx.store,
                &reception_view.id,
                ContactUpdate {
                    address: Some(address.to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        }

        let resolved = resolve_patient(&clinic.ctx.store, jane.patient_number.as_str())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(resolved.address, "3 Pine Ct");
    }

    proptest! {
        #[test]
        fn unknown_numbers_are_never_transport(suffix in 0u32..100_000, year in 2000i32..2100) {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .unwrap();
            let clinic = Clinic::new();
            let number = PatientNumber::new("HMS", year, suffix);

            let result = runtime.block_on(resolve_patient(&clinic.ctx.store, number.as_str()));
            prop_assert_eq!(result, Ok(None));
        }
    }
}
