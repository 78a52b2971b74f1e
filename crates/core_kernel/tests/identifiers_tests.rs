//! Unit tests for identifiers and human-facing codes

use core_kernel::identifiers::next_stamp;
use core_kernel::{BillId, BillNumber, ClientCode, ClientId, NotificationId, VisitId};
use std::collections::HashSet;
use uuid::Uuid;

mod uuid_ids {
    use super::*;

    #[test]
    fn test_new_generates_unique_ids() {
        assert_ne!(ClientId::new(), ClientId::new());
    }

    #[test]
    fn test_new_v7_generates_time_ordered_ids() {
        let id1 = BillId::new_v7();
        std::thread::sleep(std::time::Duration::from_millis(2));
        let id2 = BillId::new_v7();
        let uuid1: Uuid = id1.into();
        let uuid2: Uuid = id2.into();
        assert!(uuid1 < uuid2);
    }

    #[test]
    fn test_parse_accepts_prefixed_form() {
        let uuid = Uuid::new_v4();
        let parsed: NotificationId = format!("NTF-{}", uuid).parse().unwrap();
        assert_eq!(*parsed.as_uuid(), uuid);
        assert_eq!(NotificationId::prefix(), "NTF");
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!("not-a-uuid".parse::<ClientId>().is_err());
    }

    #[test]
    fn test_serializes_as_bare_uuid() {
        let uuid = Uuid::new_v4();
        let json = serde_json::to_string(&BillId::from_uuid(uuid)).unwrap();
        assert_eq!(json, format!("\"{}\"", uuid));
    }
}

mod generated_codes {
    use super::*;

    #[test]
    fn test_bill_numbers_do_not_repeat_in_a_burst() {
        let numbers: HashSet<String> = (0..500)
            .map(|_| BillNumber::generate().to_string())
            .collect();
        assert_eq!(numbers.len(), 500);
    }

    #[test]
    fn test_visit_ids_use_visit_prefix() {
        let visit = VisitId::generate();
        assert!(visit.as_str().starts_with("VISIT"));
        assert_eq!(VisitId::prefix(), "VISIT");
    }

    #[test]
    fn test_stamp_is_close_to_wall_clock() {
        let before = chrono::Utc::now().timestamp_millis();
        let stamp = next_stamp();
        assert!(stamp >= before);
    }

    #[test]
    fn test_stamps_are_unique_across_threads() {
        let handles: Vec<_> = (0..4)
            .map(|_| std::thread::spawn(|| (0..250).map(|_| next_stamp()).collect::<Vec<_>>()))
            .collect();
        let mut all = HashSet::new();
        for handle in handles {
            for stamp in handle.join().unwrap() {
                assert!(all.insert(stamp));
            }
        }
        assert_eq!(all.len(), 1000);
    }
}

mod client_codes {
    use super::*;

    #[test]
    fn test_parse_and_sequence() {
        let code: ClientCode = "CLT015".parse().unwrap();
        assert_eq!(code.sequence(), Some(15));
        assert_eq!(code.to_string(), "CLT015");
    }

    #[test]
    fn test_rejects_other_prefixes() {
        assert!("CLI015".parse::<ClientCode>().is_err());
        assert!("CLT".parse::<ClientCode>().is_err());
    }

    #[test]
    fn test_codes_past_999_grow() {
        assert_eq!(ClientCode::from_sequence(1000).as_str(), "CLT1000");
    }
}
