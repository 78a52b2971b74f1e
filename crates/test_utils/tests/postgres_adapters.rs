//! PostgreSQL adapter tests against a throwaway container
//!
//! Run with `cargo test -p test_utils -- --ignored` on a machine with docker.

use std::sync::Arc;

use chrono::Utc;
use rust_decimal_macros::dec;

use core_kernel::{EffectStatus, PageRequest, PaymentStatus, PortError, RecipientId};
use domain_billing::{
    BillLedgerFacts, BillPort, BillQuery, BillingService, GstConfig, GstConfigPort, GstService,
    GstUpdate, RECORD_VISIT,
};
use domain_client::{ClientLedger, ClientPort, NOTIFY_ADMINS, NOTIFY_MANAGERS};
use domain_notification::{
    NotificationFanout, NotificationPort, NotificationQuery, RecipientDirectory, StaffRole, Viewer,
};
use infra_db::{
    PostgresBillAdapter, PostgresClientAdapter, PostgresGstConfigAdapter,
    PostgresNotificationAdapter, PostgresStaffDirectory,
};
use test_utils::{
    assert_bill_arithmetic, assert_client_aggregates, assert_page, assert_side_effect, db_test,
    PhoneFixtures, ServiceFixtures, StaffFixtures, TestBillBuilder, TestBillRequestBuilder,
    TestClientBuilder, TestNotificationBuilder,
};

db_test!(test_client_codes_are_sequential, |db| {
    let clients = PostgresClientAdapter::new(db.pool.clone());
    let first = clients.next_client_code().await.unwrap();
    let second = clients.next_client_code().await.unwrap();
    assert_eq!(first.as_str(), "CLT001");
    assert_eq!(second.as_str(), "CLT002");
});

db_test!(test_client_round_trip_with_visits, |db| {
    let clients = PostgresClientAdapter::new(db.pool.clone());
    let client = TestClientBuilder::new()
        .with_name("Asha Rao")
        .with_phone(PhoneFixtures::normalized())
        .build();
    let stored = clients.insert(client.clone()).await.unwrap();
    assert_eq!(stored.id, client.id);

    let visit = domain_client::VisitInput {
        total_amount: Some(dec!(535)),
        ..Default::default()
    }
    .resolve()
    .unwrap();
    let updated = clients.append_visit(client.id, visit).await.unwrap();
    assert_eq!(updated.total_visits, 1);
    assert_eq!(updated.total_spent, dec!(535));
    assert_client_aggregates(&updated);

    let found = clients.find_by_phone(PhoneFixtures::normalized()).await.unwrap().unwrap();
    assert_eq!(found.visits.len(), 1);

    let hits = clients.search("asha").await.unwrap();
    assert_eq!(hits.len(), 1);
});

db_test!(test_duplicate_phone_is_conflict, |db| {
    let clients = PostgresClientAdapter::new(db.pool.clone());
    let phone = PhoneFixtures::other();
    clients
        .insert(TestClientBuilder::new().with_code(1).with_phone(phone).build())
        .await
        .unwrap();
    let err = clients
        .insert(TestClientBuilder::new().with_code(2).with_phone(phone).build())
        .await
        .unwrap_err();
    assert!(matches!(err, PortError::Conflict { .. }), "got {:?}", err);
});

db_test!(test_bill_ledger_queries, |db| {
    let bills = PostgresBillAdapter::new(db.pool.clone());
    let client = TestClientBuilder::new().with_name("Meera Shah").build();

    let paid = TestBillBuilder::new()
        .for_client(&client)
        .with_services(vec![ServiceFixtures::haircut(), ServiceFixtures::facial()])
        .with_rate(dec!(18))
        .build();
    let pending = TestBillBuilder::new()
        .for_client(&client)
        .with_status(PaymentStatus::Pending)
        .build();
    bills.insert(paid.clone()).await.unwrap();
    bills.insert(pending.clone()).await.unwrap();

    let by_number = bills.get_by_number(&paid.bill_number).await.unwrap().unwrap();
    assert_eq!(by_number, paid);
    assert_bill_arithmetic(&by_number);

    let page = bills
        .find(&BillQuery::matching("meera"), PageRequest::new(1, 10))
        .await
        .unwrap();
    assert_page(&page, 2, 2);
    assert_eq!(page.items[0].id, pending.id);

    let summary = bills.summarize(&BillQuery::for_client(client.id)).await.unwrap();
    assert_eq!(summary.total_amount, paid.final_amount + pending.final_amount);
    assert_eq!(summary.paid_amount, paid.final_amount);

    let stats = bills.stats(Utc::now()).await.unwrap();
    assert_eq!(stats.total_bills, 2);
    assert_eq!(stats.today_revenue, paid.final_amount);
    assert_eq!(stats.top_services[0].name, "Haircut");
    assert_eq!(stats.top_services[0].count, 2);
});

db_test!(test_gst_revisions, |db| {
    let store = PostgresGstConfigAdapter::new(db.pool.clone());
    assert!(store.current().await.unwrap().is_none());

    let actor = StaffFixtures::admin();
    let seeded = store.append(GstConfig::seed(&actor)).await.unwrap();
    let update = GstUpdate::parse(Some(dec!(18)), None, None).unwrap();
    store.append(seeded.revise(&update, &actor)).await.unwrap();

    let current = store.current().await.unwrap().unwrap();
    assert_eq!(current.revision, 2);
    assert_eq!(current.gst_percentage.value(), dec!(18));
    assert!(current.is_active);

    let err = store.append(GstConfig::seed(&actor)).await.unwrap_err();
    assert!(err.is_conflict());
    assert_eq!(store.history(10).await.unwrap().len(), 2);
});

db_test!(test_notification_fanout_reaches_accounts_and_employees, |db| {
    let admin = db.seed_admin("Owner").await.unwrap();
    let employee = db.seed_employee("Front desk", "admin", true).await.unwrap();
    db.seed_employee("Former staff", "admin", false).await.unwrap();

    let directory = PostgresStaffDirectory::new(db.pool.clone());
    assert_eq!(directory.role_accounts(StaffRole::Admin).await.unwrap().len(), 1);
    assert_eq!(directory.active_employees(StaffRole::Admin).await.unwrap().len(), 1);

    let store = Arc::new(PostgresNotificationAdapter::new(db.pool.clone()));
    let fanout = NotificationFanout::new(store.clone(), Arc::new(directory));
    assert!(fanout.notify_all_admins(&TestNotificationBuilder::new().build()).await);
    assert!(!fanout.notify_all_managers(&TestNotificationBuilder::new().build()).await);

    for id in [admin, employee] {
        let viewer = Viewer::new(RecipientId::from_uuid(id), None);
        let page = store
            .find(&NotificationQuery::for_viewer(viewer), PageRequest::new(1, 20))
            .await
            .unwrap();
        assert_eq!(page.total, 1);
    }
});

db_test!(test_bill_creation_end_to_end, |db| {
    db.seed_admin("Owner").await.unwrap();
    let pool = db.pool.clone();

    let bills: Arc<dyn BillPort> = Arc::new(PostgresBillAdapter::new(pool.clone()));
    let fanout = Arc::new(NotificationFanout::new(
        Arc::new(PostgresNotificationAdapter::new(pool.clone())),
        Arc::new(PostgresStaffDirectory::new(pool.clone())),
    ));
    let clients = Arc::new(ClientLedger::new(
        Arc::new(PostgresClientAdapter::new(pool.clone())),
        Arc::new(BillLedgerFacts::new(bills.clone())),
        fanout,
    ));
    let gst = Arc::new(GstService::new(Arc::new(PostgresGstConfigAdapter::new(pool.clone()))));
    gst.get(&StaffFixtures::admin()).await.unwrap();
    let billing = BillingService::new(bills, gst, clients.clone());

    let request = TestBillRequestBuilder::new()
        .with_phone(PhoneFixtures::formatted())
        .with_subtotal(dec!(1000))
        .with_discount(dec!(100))
        .build();
    let outcome = billing.create_bill(request, None).await.unwrap();
    assert_eq!(outcome.primary.gst_percentage, dec!(7));
    assert_eq!(outcome.primary.final_amount, dec!(963.00));
    assert_side_effect(&outcome, RECORD_VISIT, EffectStatus::Applied);
    assert_side_effect(&outcome, NOTIFY_ADMINS, EffectStatus::Applied);
    assert_side_effect(&outcome, NOTIFY_MANAGERS, EffectStatus::Failed);

    let client = clients.get_client(outcome.primary.client_id).await.unwrap();
    assert_eq!(client.phone_number, PhoneFixtures::normalized());
    assert_eq!(client.total_spent, dec!(963.00));

    let history = clients.client_history(client.id).await.unwrap();
    assert_eq!(history.visits.len(), 1);
    assert_eq!(history.visits[0].bill_number.as_ref(), Some(&outcome.primary.bill_number));
});
