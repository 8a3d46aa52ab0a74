//! Dependent-field form engine for the back-office promotion pages.
//!
//! A [`FormSpec`] declares fields, always-on rules and the mode selectors
//! (discount type, reward type, ...) that decide which other fields matter.
//! A [`FormController`] drives one editing session over it: it keeps the
//! active rules in sync with the selected modes, validates date ranges,
//! converts values between their displayed and wire units, and submits
//! through an [`EntityService`].
//!
//! ```rust
//! use std::sync::Arc;
//! use engine::{FormController, Value, forms::FormKind};
//!
//! let spec = Arc::new(FormKind::PromoCode.spec().unwrap());
//! let mut form = FormController::new(spec);
//! form.init_create().unwrap();
//! form.set_value("discountType", Value::text("percentage")).unwrap();
//! form.set_value("discountValue", Value::Number(15.0)).unwrap();
//! assert_eq!(form.payload()["discountValue"], serde_json::json!(0.15));
//! ```

pub use controller::{FormController, Phase, SubmitRequest, Target};
pub use error::{FormError, ServiceError};
pub use form::{FieldSpec, FormSpec, FormSpecBuilder};
pub use modes::{ModeRule, ModeSelector, SwitchPolicy};
pub use reference::{ReferenceCache, ReferenceLoader};
pub use rules::{FieldError, Rule, ValidationReport};
pub use service::EntityService;
pub use state::FieldState;
pub use transcode::{Codec, TranscodeRule};
pub use value::{FieldKind, Value};

pub mod controller;
pub mod dates;
mod error;
pub mod form;
pub mod forms;
pub mod modes;
pub mod reference;
pub mod rules;
pub mod service;
mod state;
pub mod transcode;
pub mod value;
