//! Test Data Builders
//!
//! Builders with sensible defaults so tests only spell out the fields they
//! care about.

use chrono::{DateTime, Utc};
use fake::faker::name::en::Name;
use fake::Fake;
use rust_decimal::Decimal;

use core_kernel::{
    ClientCode, ClientId, PaymentMethod, PaymentStatus, Percentage, ServiceLine, ServiceLineInput,
    StaffId,
};
use domain_billing::{Bill, BillAmounts, BillDraft, ClientRef, CreateBillRequest};
use domain_client::{Client, VisitInput};
use domain_notification::{NotificationPayload, NotificationType, Priority, RelatedEntityType};

use crate::fixtures::{CodeFixtures, MoneyFixtures, PhoneFixtures, ServiceFixtures};

/// A random full name
pub fn random_name() -> String {
    Name().fake()
}

/// A random normalised ten-digit phone number
pub fn random_phone() -> String {
    let first: u8 = (6u8..10).fake();
    let rest: u64 = (0u64..1_000_000_000).fake();
    format!("{}{:09}", first, rest)
}

/// Builds a `Client`, optionally with visits
pub struct TestClientBuilder {
    code: ClientCode,
    name: String,
    phone: String,
    created_at: Option<DateTime<Utc>>,
    visits: Vec<VisitInput>,
}

impl Default for TestClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TestClientBuilder {
    pub fn new() -> Self {
        Self {
            code: CodeFixtures::first_client(),
            name: random_name(),
            phone: random_phone(),
            created_at: None,
            visits: Vec::new(),
        }
    }

    pub fn with_code(mut self, sequence: u64) -> Self {
        self.code = ClientCode::from_sequence(sequence);
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = phone.into();
        self
    }

    pub fn created_at(mut self, at: DateTime<Utc>) -> Self {
        self.created_at = Some(at);
        self
    }

    /// Adds a visit with the given final amount
    pub fn with_visit(mut self, final_amount: Decimal) -> Self {
        self.visits.push(VisitInput {
            total_amount: Some(final_amount),
            final_amount: Some(final_amount),
            ..Default::default()
        });
        self
    }

    pub fn with_visit_input(mut self, input: VisitInput) -> Self {
        self.visits.push(input);
        self
    }

    pub fn build(self) -> Client {
        let mut client = Client::new(self.code, self.name, self.phone);
        if let Some(at) = self.created_at {
            client.created_at = at;
            client.updated_at = at;
        }
        for input in self.visits {
            let visit = input.resolve().expect("test visit must be valid");
            client.record_visit(visit);
        }
        client
    }
}

/// Builds a stored `Bill` with computed amounts
pub struct TestBillBuilder {
    client_id: ClientId,
    client_name: String,
    client_phone: String,
    services: Vec<ServiceLine>,
    subtotal: Option<Decimal>,
    discount: Decimal,
    rate: Percentage,
    payment_method: PaymentMethod,
    payment_status: PaymentStatus,
    created_by: Option<StaffId>,
    created_at: Option<DateTime<Utc>>,
}

impl Default for TestBillBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TestBillBuilder {
    pub fn new() -> Self {
        Self {
            client_id: ClientId::new_v7(),
            client_name: random_name(),
            client_phone: PhoneFixtures::normalized().to_string(),
            services: vec![ServiceFixtures::haircut()],
            subtotal: None,
            discount: Decimal::ZERO,
            rate: MoneyFixtures::default_gst(),
            payment_method: PaymentMethod::Cash,
            payment_status: PaymentStatus::Paid,
            created_by: None,
            created_at: None,
        }
    }

    /// Bills the given client
    pub fn for_client(mut self, client: &Client) -> Self {
        self.client_id = client.id;
        self.client_name = client.name.clone();
        self.client_phone = client.phone_number.clone();
        self
    }

    pub fn with_services(mut self, services: Vec<ServiceLine>) -> Self {
        self.services = services;
        self
    }

    /// Overrides the subtotal summed from the services
    pub fn with_subtotal(mut self, subtotal: Decimal) -> Self {
        self.subtotal = Some(subtotal);
        self
    }

    pub fn with_discount(mut self, discount: Decimal) -> Self {
        self.discount = discount;
        self
    }

    pub fn with_rate(mut self, rate: Decimal) -> Self {
        self.rate = MoneyFixtures::gst(rate);
        self
    }

    pub fn with_status(mut self, status: PaymentStatus) -> Self {
        self.payment_status = status;
        self
    }

    pub fn with_method(mut self, method: PaymentMethod) -> Self {
        self.payment_method = method;
        self
    }

    pub fn created_by(mut self, staff: StaffId) -> Self {
        self.created_by = Some(staff);
        self
    }

    pub fn created_at(mut self, at: DateTime<Utc>) -> Self {
        self.created_at = Some(at);
        self
    }

    pub fn build(self) -> Bill {
        let amounts = match self.subtotal {
            Some(subtotal) => BillAmounts::from_subtotal(subtotal, self.discount, self.rate),
            None => BillAmounts::from_services(&self.services, self.discount, self.rate),
        };
        let draft = BillDraft {
            client: ClientRef::Id(self.client_id),
            client_name: self.client_name,
            client_phone: Some(self.client_phone.clone()),
            services: self.services,
            subtotal: amounts.subtotal,
            discount: self.discount,
            payment_method: self.payment_method,
            payment_status: self.payment_status,
            notes: String::new(),
            specialist: String::new(),
            appointment_date: None,
            start_time: None,
            total_duration: None,
            created_by: self.created_by,
        };
        let mut bill = Bill::new(draft, self.client_id, self.client_phone, amounts);
        if let Some(at) = self.created_at {
            bill.created_at = at;
            bill.updated_at = at;
        }
        bill
    }
}

/// Builds the body of a create-bill request
pub struct TestBillRequestBuilder {
    request: CreateBillRequest,
}

impl Default for TestBillRequestBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TestBillRequestBuilder {
    /// A walk-in identified by phone with one haircut
    pub fn new() -> Self {
        let haircut = ServiceFixtures::haircut();
        Self {
            request: CreateBillRequest {
                client_name: Some(random_name()),
                client_phone: Some(PhoneFixtures::normalized().to_string()),
                services: vec![input(&haircut)],
                subtotal: Some(haircut.price),
                payment_method: Some(PaymentMethod::Cash.as_str().to_string()),
                payment_status: Some(PaymentStatus::Paid.as_str().to_string()),
                ..Default::default()
            },
        }
    }

    pub fn for_client(mut self, id: ClientId) -> Self {
        self.request.client_id = Some(id);
        self.request.client_phone = None;
        self
    }

    pub fn with_phone(mut self, phone: impl Into<String>) -> Self {
        self.request.client_phone = Some(phone.into());
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.request.client_name = Some(name.into());
        self
    }

    pub fn with_services(mut self, services: &[ServiceLine]) -> Self {
        self.request.services = services.iter().map(input).collect();
        self
    }

    pub fn with_subtotal(mut self, subtotal: Decimal) -> Self {
        self.request.subtotal = Some(subtotal);
        self
    }

    pub fn with_discount(mut self, discount: Decimal) -> Self {
        self.request.discount = Some(discount);
        self
    }

    pub fn with_status(mut self, status: &str) -> Self {
        self.request.payment_status = Some(status.to_string());
        self
    }

    pub fn build(self) -> CreateBillRequest {
        self.request
    }
}

fn input(line: &ServiceLine) -> ServiceLineInput {
    ServiceLineInput {
        name: Some(line.name.clone()),
        price: Some(line.price),
        duration: line.duration,
        description: line.description.clone(),
    }
}

/// Builds a notification payload
pub struct TestNotificationBuilder {
    payload: NotificationPayload,
}

impl Default for TestNotificationBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TestNotificationBuilder {
    pub fn new() -> Self {
        Self {
            payload: NotificationPayload::new("Test notification", "Something happened", NotificationType::General),
        }
    }

    pub fn titled(mut self, title: impl Into<String>) -> Self {
        self.payload.title = title.into();
        self
    }

    pub fn of_type(mut self, notification_type: NotificationType) -> Self {
        self.payload.notification_type = notification_type;
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.payload = self.payload.with_priority(priority);
        self
    }

    pub fn about_bill(mut self, bill: &Bill) -> Self {
        self.payload = self.payload.related_to(RelatedEntityType::Bill, bill.bill_number.as_str());
        self
    }

    pub fn scheduled_for(mut self, at: DateTime<Utc>) -> Self {
        self.payload.scheduled_for = Some(at);
        self
    }

    pub fn build(self) -> NotificationPayload {
        self.payload
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_random_phone_is_ten_digits() {
        for _ in 0..20 {
            let phone = random_phone();
            assert_eq!(phone.len(), 10);
            assert!(phone.chars().all(|c| c.is_ascii_digit()));
        }
    }

    #[test]
    fn test_client_builder_records_visits() {
        let client = TestClientBuilder::new()
            .with_visit(dec!(535))
            .with_visit(dec!(100.25))
            .build();
        assert_eq!(client.total_visits, 2);
        assert_eq!(client.total_spent, dec!(635.25));
        assert!(client.last_visit.is_some());
    }

    #[test]
    fn test_bill_builder_computes_amounts() {
        let bill = TestBillBuilder::new()
            .with_subtotal(MoneyFixtures::subtotal())
            .with_discount(MoneyFixtures::discount())
            .with_rate(dec!(18))
            .build();
        assert_eq!(bill.amount_before_gst, dec!(900));
        assert_eq!(bill.gst_amount, dec!(162.00));
        assert_eq!(bill.final_amount, dec!(1062.00));
        assert!(bill.paid_at.is_some());
    }

    #[test]
    fn test_request_builder_targets_existing_client() {
        let id = ClientId::new_v7();
        let request = TestBillRequestBuilder::new().for_client(id).build();
        assert_eq!(request.client_id, Some(id));
        assert!(request.client_phone.is_none());
    }
}
