//! Admission gating and message throttling.
//!
//! - **Admission**: who leaves the waiting room and who gets promoted
//! - **Throttle**: broadcast guard windows and log-once bookkeeping

pub mod admission;
pub mod throttle;

pub use admission::{
    AdmissionContext, AdmissionDecision, AdmitKind, BadUsers, PromotionContext, PromotionDecision,
    SkipReason, evaluate_admission, evaluate_promotion,
};
pub use throttle::{BroadcastThrottle, GuardBlock, NoticeLog};
