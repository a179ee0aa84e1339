//! # ClinicSlot Core
//!
//! Domain types and operations of the slot reservation core: the slot
//! catalog, the reservation ledger (claims, releases and status changes) and
//! availability queries. Operations are generic over a [`store::ReservationStore`]
//! handle that the host process creates and passes in.

pub mod availability;
pub mod catalog;
pub mod errors;
pub mod ledger;
pub mod models;
pub mod store;
