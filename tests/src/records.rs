//! History Aggregation Tests
//!
//! Section counts and ordering, independent section failures and store
//! timeouts.

#[cfg(test)]
mod tests {
    use crate::fault::{Fault, Op};
    use crate::fixtures::{jane_doe, john_roe, Clinic, SHORT};
    use hms_shared::{ErrorKind, HmsError, StoreError, Table};
    use prescriptions::add_prescription;
    use prescriptions_integrity::NewPrescription;
    use records::{add_lab_report, aggregate_history};
    use records_integrity::NewLabReport;
    use std::time::Duration;

    #[tokio::test]
    async fn test_counts_and_strict_ordering() {
        let clinic = Clinic::new();
        let jane = clinic.patient(jane_doe(), 1).await;
        let john = clinic.patient(john_roe(), 2).await;
        let adams = clinic.doctor("Dr. Adams", "Cardiology").await;

        let (n, m) = (4, 3);
        for i in 0..n {
            for patient in [&jane, &john] {
                add_prescription(
                    &clinic.ctx.store,
                    NewPrescription {
                        patient_id: patient.id.clone(),
                        doctor_id: adams.id.clone(),
                        diagnosis: format!("Visit {}", i),
                        prescription_text: "Rest".to_string(),
                    },
                )
                .await
                .unwrap();
            }
        }
        for i in 0..m {
            add_lab_report(
                &clinic.ctx.store,
                NewLabReport {
                    patient_id: jane.id.clone(),
                    test_name: format!("Panel {}", i),
                    test_result: "Normal".to_string(),
                    notes: None,
                },
            )
            .await
            .unwrap();
        }

        let history = aggregate_history(&clinic.ctx.store, &jane.id).await;
        let prescriptions = history.prescriptions.items().unwrap();
        let lab_reports = history.lab_reports.items().unwrap();

        assert_eq!(prescriptions.len(), n);
        assert_eq!(lab_reports.len(), m);
        assert!(prescriptions.iter().all(|e| e.prescription.patient_id == jane.id));
        for pair in prescriptions.windows(2) {
            assert!(pair[0].prescription.created_at > pair[1].prescription.created_at);
        }
        for pair in lab_reports.windows(2) {
            assert!(pair[0].created_at > pair[1].created_at);
        }
        assert_eq!(prescriptions[0].prescription.diagnosis, "Visit 3");
        assert_eq!(lab_reports[0].test_name, "Panel 2");
    }

    #[tokio::test]
    async fn test_each_section_fails_on_its_own() {
        let clinic = Clinic::new();
        let jane = clinic.patient(jane_doe(), 1).await;
        add_lab_report(
            &clinic.ctx.store,
            NewLabReport {
                patient_id: jane.id.clone(),
                test_name: "Blood Pressure".to_string(),
                test_result: "150/95 mmHg".to_string(),
                notes: None,
            },
        )
        .await
        .unwrap();

        clinic.backend.inject(
            Table::Prescriptions,
            Op::Select,
            Fault::Fail(StoreError::Unavailable("reset by peer".to_string())),
        );
        let history = aggregate_history(&clinic.ctx.store, &jane.id).await;

        assert!(history.is_complete());
        assert!(!history.is_fully_loaded());
        assert_eq!(
            history.prescriptions.error().map(HmsError::kind),
            Some(ErrorKind::Transport)
        );
        assert_eq!(history.lab_reports.items().map(<[_]>::len), Some(1));
    }

    #[tokio::test]
    async fn test_slow_section_times_out() {
        let clinic = Clinic::with_timeout(20);
        let jane = clinic.patient(jane_doe(), 1).await;

        clinic
            .backend
            .inject(Table::LabReports, Op::Select, Fault::Delay(Duration::from_millis(500)));
        let history = aggregate_history(&clinic.ctx.store, &jane.id).await;

        assert_eq!(
            history.lab_reports.error(),
            Some(&HmsError::Store(StoreError::Timeout { after_ms: 20 }))
        );
        assert!(history.prescriptions.is_loaded());
    }

    #[tokio::test]
    async fn test_lab_order_follows_store_creation_not_desk_clock() {
        let clinic = Clinic::new();
        let jane = clinic.patient(jane_doe(), 1).await;
        let panel = |name: &str| NewLabReport {
            patient_id: jane.id.clone(),
            test_name: name.to_string(),
            test_result: "Normal".to_string(),
            notes: None,
        };

        // The first desk's insert is held back; the second lands before it
        clinic
            .backend
            .inject(Table::LabReports, Op::Insert, Fault::Delay(SHORT * 2));
        let (slow, fast) = tokio::join!(add_lab_report(&clinic.ctx.store, panel("Slow")), async {
            tokio::time::sleep(SHORT / 2).await;
            clinic.backend.heal();
            add_lab_report(&clinic.ctx.store, panel("Fast")).await
        });
        let (slow, fast) = (slow.unwrap(), fast.unwrap());
        assert!(slow.test_date < fast.test_date);
        assert!(slow.created_at > fast.created_at);

        let history = aggregate_history(&clinic.ctx.store, &jane.id).await;
        let lab_reports = history.lab_reports.items().unwrap();
        let names: Vec<&str> = lab_reports.iter().map(|r| r.test_name.as_str()).collect();
        assert_eq!(names, vec!["Slow", "Fast"]);
        for pair in lab_reports.windows(2) {
            assert!(pair[0].created_at > pair[1].created_at);
        }
    }

    #[tokio::test]
    async fn test_sections_load_concurrently() {
        let clinic = Clinic::new();
        let jane = clinic.patient(jane_doe(), 1).await;

        clinic
            .backend
            .inject(Table::Prescriptions, Op::Select, Fault::Delay(SHORT * 4));
        clinic
            .backend
            .inject(Table::LabReports, Op::Select, Fault::Delay(SHORT * 4));

        let started = tokio::time::Instant::now();
        let history = aggregate_history(&clinic.ctx.store, &jane.id).await;
        assert!(history.is_fully_loaded());
        assert!(started.elapsed() < SHORT * 8);
    }
}
