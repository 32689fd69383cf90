//! Registration and login for customers and stores.
//!
//! PINs and passwords are stored as argon2 hashes and checked with argon2's
//! verifier, never compared as plaintext. A login for an unknown phone still
//! runs one verification, against a throwaway hash, so both misses cost the
//! same.

use std::sync::OnceLock;

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use serde::Deserialize;
use tracing::{info, warn};
use validator::Validate;

use crate::db::Database;
use crate::domain::aggregates::{Customer, Store};
use crate::domain::value_objects::Address;
use crate::error::{Result, StorefrontError};
use crate::services::events::EventPublisher;

#[derive(Debug, Deserialize, Validate)]
pub struct AddressForm {
    #[validate(length(min = 1, max = 50))]
    pub flat_no: String,
    #[validate(length(min = 1, max = 200))]
    pub street: String,
    #[serde(default)]
    #[validate(length(max = 200))]
    pub landmark: String,
    #[validate(length(min = 1, max = 100))]
    pub city: String,
    #[validate(length(min = 1, max = 100))]
    pub state: String,
    #[validate(length(min = 4, max = 10))]
    pub pincode: String,
}

fn trimmed(value: String) -> String { value.trim().to_string() }

impl AddressForm {
    fn normalized(self) -> Self {
        Self {
            flat_no: trimmed(self.flat_no),
            street: trimmed(self.street),
            landmark: trimmed(self.landmark),
            city: trimmed(self.city),
            state: trimmed(self.state),
            pincode: trimmed(self.pincode),
        }
    }
}

impl From<AddressForm> for Address {
    fn from(f: AddressForm) -> Self {
        Self { flat_no: f.flat_no, street: f.street, landmark: f.landmark, city: f.city, state: f.state, pincode: f.pincode }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct CustomerRegistration {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(length(min = 7, max = 15))]
    pub phone: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 4, max = 12))]
    pub pin: String,
    #[serde(flatten)]
    #[validate]
    pub address: AddressForm,
}

#[derive(Debug, Deserialize, Validate)]
pub struct StoreRegistration {
    #[validate(length(min = 1, max = 100))]
    pub store_name: String,
    #[validate(length(min = 1, max = 100))]
    pub owner_name: String,
    #[validate(length(min = 7, max = 15))]
    pub phone: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 6, max = 128))]
    pub password: String,
    #[serde(flatten)]
    #[validate]
    pub address: AddressForm,
}

impl CustomerRegistration {
    /// Trimmed fields and a lowercased email; validation runs on this form.
    fn normalized(self) -> Self {
        Self { name: trimmed(self.name), phone: trimmed(self.phone), email: normalize_email(&self.email), pin: self.pin, address: self.address.normalized() }
    }
}

impl StoreRegistration {
    fn normalized(self) -> Self {
        Self {
            store_name: trimmed(self.store_name),
            owner_name: trimmed(self.owner_name),
            phone: trimmed(self.phone),
            email: normalize_email(&self.email),
            password: self.password,
            address: self.address.normalized(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CustomerLogin {
    pub phone: String,
    pub pin: String,
}

#[derive(Debug, Deserialize)]
pub struct StoreLogin {
    pub phone: String,
    pub password: String,
}

fn normalize_email(email: &str) -> String { email.trim().to_lowercase() }

pub async fn register_customer(db: &dyn Database, events: &EventPublisher, form: CustomerRegistration) -> Result<Customer> {
    let form = form.normalized();
    form.validate()?;
    if db.customer_by_email(&form.email).await?.is_some() {
        return Err(StorefrontError::Conflict("An account with this email already exists.".into()));
    }
    if db.customer_by_phone(&form.phone).await?.is_some() {
        return Err(StorefrontError::Conflict("An account with this phone number already exists.".into()));
    }

    let pin_hash = hash_secret(&form.pin)?;
    let (customer, event) = Customer::register(form.name, form.phone, form.email, pin_hash, form.address.into());
    db.insert_customer(&customer).await?;
    info!(customer_id = %customer.id, "customer registered");
    events.publish(event).await;
    Ok(customer)
}

pub async fn register_store(db: &dyn Database, events: &EventPublisher, form: StoreRegistration) -> Result<Store> {
    let form = form.normalized();
    form.validate()?;
    if db.store_by_phone(&form.phone).await?.is_some() {
        return Err(StorefrontError::Conflict("A store with this phone number already exists.".into()));
    }
    if db.store_by_email(&form.email).await?.is_some() {
        return Err(StorefrontError::Conflict("A store with this email already exists.".into()));
    }

    let password_hash = hash_secret(&form.password)?;
    let (store, event) = Store::register(form.store_name, form.owner_name, form.phone, form.email, password_hash, form.address.into());
    db.insert_store(&store).await?;
    info!(store_id = %store.id, "store registered");
    events.publish(event).await;
    Ok(store)
}

pub async fn login_customer(db: &dyn Database, form: &CustomerLogin) -> Result<Customer> {
    let customer = db.customer_by_phone(form.phone.trim()).await?;
    let verified = verify_secret(&form.pin, customer.as_ref().map_or_else(|| absent_account_hash(), |c| c.pin_hash.as_str()));
    match customer {
        Some(c) if verified => {
            info!(customer_id = %c.id, "customer logged in");
            Ok(c)
        }
        _ => {
            warn!("customer login rejected");
            Err(StorefrontError::Unauthorized("Invalid phone number or PIN. Please try again.".into()))
        }
    }
}

pub async fn login_store(db: &dyn Database, form: &StoreLogin) -> Result<Store> {
    let store = db.store_by_phone(form.phone.trim()).await?;
    let verified = verify_secret(&form.password, store.as_ref().map_or_else(|| absent_account_hash(), |s| s.password_hash.as_str()));
    match store {
        Some(s) if verified => {
            info!(store_id = %s.id, "store logged in");
            Ok(s)
        }
        _ => {
            warn!("store login rejected");
            Err(StorefrontError::Unauthorized("Invalid phone number or password. Please try again.".into()))
        }
    }
}

/// Hash a PIN or password with Argon2id.
pub fn hash_secret(secret: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(secret.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| StorefrontError::Internal("credential hashing failed".into()))
}

/// Hash checked when no account matches the phone number. No secret verifies
/// against it.
fn absent_account_hash() -> &'static str {
    static HASH: OnceLock<String> = OnceLock::new();
    HASH.get_or_init(|| hash_secret(&uuid::Uuid::new_v4().to_string()).unwrap_or_default())
}

/// Constant-time check of a secret against a stored argon2 hash.
pub fn verify_secret(secret: &str, hash: &str) -> bool {
    PasswordHash::new(hash)
        .map(|parsed| Argon2::default().verify_password(secret.as_bytes(), &parsed).is_ok())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryDatabase;

    fn address() -> AddressForm {
        AddressForm { flat_no: "7".into(), street: "Ring Road".into(), landmark: String::new(), city: "Delhi".into(), state: "DL".into(), pincode: "110001".into() }
    }

    fn registration(phone: &str, email: &str) -> CustomerRegistration {
        CustomerRegistration { name: "Ravi".into(), phone: phone.into(), email: email.into(), pin: "4321".into(), address: address() }
    }

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_secret("1234").unwrap();
        assert_ne!(hash, "1234");
        assert!(verify_secret("1234", &hash));
        assert!(!verify_secret("1235", &hash));
        assert!(!verify_secret("1234", "not-a-hash"));
    }

    #[test]
    fn test_absent_account_hash_is_a_real_hash() {
        let hash = absent_account_hash();
        assert!(PasswordHash::new(hash).is_ok());
        assert_eq!(hash, absent_account_hash());
        assert!(!verify_secret("", hash));
        assert!(!verify_secret("4321", hash));
    }

    #[tokio::test]
    async fn test_unknown_phone_is_rejected_like_a_wrong_pin() {
        let db = MemoryDatabase::new();
        register_customer(&db, &EventPublisher::disabled(), registration("9876543210", "ravi@example.com")).await.unwrap();
        let unknown = login_customer(&db, &CustomerLogin { phone: "9000000009".into(), pin: "4321".into() }).await;
        let wrong = login_customer(&db, &CustomerLogin { phone: "9876543210".into(), pin: "0000".into() }).await;
        match (unknown, wrong) {
            (Err(StorefrontError::Unauthorized(a)), Err(StorefrontError::Unauthorized(b))) => assert_eq!(a, b),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_registration_fields_are_trimmed_before_validation() {
        let db = MemoryDatabase::new();
        let mut form = registration(" 9876543210 ", "  Ravi@Example.com ");
        form.name = "  Ravi  ".into();
        form.address.pincode = " 110001 ".into();
        let c = register_customer(&db, &EventPublisher::disabled(), form).await.unwrap();
        assert_eq!(c.name, "Ravi");
        assert_eq!(c.phone, "9876543210");
        assert_eq!(c.address.pincode, "110001");

        // Blank after trimming is still too short.
        let mut blank = registration("9000000000", "other@example.com");
        blank.name = "   ".into();
        let rejected = register_customer(&db, &EventPublisher::disabled(), blank).await;
        assert!(matches!(rejected, Err(StorefrontError::InvalidArgument(ref m)) if m.contains("name")));
    }

    #[tokio::test]
    async fn test_register_and_login_customer() {
        let db = MemoryDatabase::new();
        let events = EventPublisher::disabled();
        let c = register_customer(&db, &events, registration("9876543210", "Ravi@Example.com ")).await.unwrap();
        assert_eq!(c.email, "ravi@example.com");

        let ok = login_customer(&db, &CustomerLogin { phone: "9876543210".into(), pin: "4321".into() }).await.unwrap();
        assert_eq!(ok.id, c.id);
        let bad = login_customer(&db, &CustomerLogin { phone: "9876543210".into(), pin: "0000".into() }).await;
        assert!(matches!(bad, Err(StorefrontError::Unauthorized(_))));
    }

    #[tokio::test]
    async fn test_duplicate_email_rejected_without_insert() {
        let db = MemoryDatabase::new();
        let events = EventPublisher::disabled();
        register_customer(&db, &events, registration("9876543210", "ravi@example.com")).await.unwrap();
        let dup = register_customer(&db, &events, registration("9000000000", "ravi@example.com")).await;
        assert!(matches!(dup, Err(StorefrontError::Conflict(ref m)) if m.contains("email")));
        let dup = register_customer(&db, &events, registration("9876543210", "other@example.com")).await;
        assert!(matches!(dup, Err(StorefrontError::Conflict(ref m)) if m.contains("phone")));
        assert_eq!(db.customer_count().await, 1);
    }

    #[tokio::test]
    async fn test_invalid_registration_rejected() {
        let db = MemoryDatabase::new();
        let bad = register_customer(&db, &EventPublisher::disabled(), registration("12", "not-an-email")).await;
        match bad {
            Err(StorefrontError::InvalidArgument(msg)) => {
                assert!(msg.contains("email"));
                assert!(msg.contains("phone"));
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_store_register_and_login() {
        let db = MemoryDatabase::new();
        let form = StoreRegistration {
            store_name: " Crust & Co ".into(), owner_name: "Meera".into(), phone: "9111111111 ".into(),
            email: " Crust@Example.com".into(), password: "secret-pass".into(), address: address(),
        };
        let s = register_store(&db, &EventPublisher::disabled(), form).await.unwrap();
        assert_eq!(s.store_name, "Crust & Co");
        assert_eq!(s.email, "crust@example.com");
        let ok = login_store(&db, &StoreLogin { phone: "9111111111".into(), password: "secret-pass".into() }).await.unwrap();
        assert_eq!(ok.id, s.id);
        assert!(login_store(&db, &StoreLogin { phone: "9111111112".into(), password: "secret-pass".into() }).await.is_err());
    }
}
