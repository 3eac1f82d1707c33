pub mod approval;
pub mod customer;
pub mod outcome;
pub mod shipment;
