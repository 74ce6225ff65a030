//! Doctor Directory Tests

#[cfg(test)]
mod tests {
    use crate::fault::{Fault, Op};
    use crate::fixtures::Clinic;
    use hms_shared::{ErrorKind, StoreError, Table};
    use provider::list_doctors;

    #[tokio::test]
    async fn test_list_doctors_twice_is_identical() {
        let clinic = Clinic::new();
        for (name, specialization) in [
            ("Dr. Okafor", "Nephrology"),
            ("Dr. Adams", "Cardiology"),
            ("Dr. Adams", "Dermatology"),
            ("Dr. Lee", "General Practice"),
        ] {
            clinic.doctor(name, specialization).await;
        }

        let first = list_doctors(&clinic.ctx.store).await.unwrap();
        let second = list_doctors(&clinic.ctx.store).await.unwrap();
        assert_eq!(first, second);

        let names: Vec<&str> = first.iter().map(|d| d.full_name.as_str()).collect();
        assert_eq!(names, vec!["Dr. Adams", "Dr. Adams", "Dr. Lee", "Dr. Okafor"]);
    }

    #[tokio::test]
    async fn test_doctor_desk_loads_directory_once() {
        let clinic = Clinic::new();
        clinic.doctor("Dr. Adams", "Cardiology").await;
        let desk = clinic.ctx.doctor();

        desk.load_doctors().await.unwrap();
        desk.load_doctors().await.unwrap();
        assert_eq!(clinic.backend.count(Table::Doctors, Op::Select), 1);
    }

    #[tokio::test]
    async fn test_directory_failure_is_transport_and_retryable() {
        let clinic = Clinic::new();
        clinic.doctor("Dr. Adams", "Cardiology").await;
        let desk = clinic.ctx.doctor();

        clinic.backend.inject(
            Table::Doctors,
            Op::Select,
            Fault::Fail(StoreError::Rejected("permission denied".to_string())),
        );
        let err = desk.load_doctors().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Transport);
        assert_eq!(desk.selected_doctor().await, None);

        clinic.backend.heal();
        assert_eq!(desk.load_doctors().await.unwrap().len(), 1);
        assert!(desk.selected_doctor().await.is_some());
    }
}
