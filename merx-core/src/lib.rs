pub mod error;
pub mod pagination;
pub mod payment;
pub mod product;
pub mod rpc;

pub use error::{BoxError, OrderError};
pub use pagination::{Page, PageMeta};
pub use payment::{BillableItem, PaymentGateway, PaymentSessionRequest};
pub use product::{ProductRecord, ProductValidator};
pub use rpc::RequestClient;
