pub mod event_create;
pub mod event_sales;
pub mod initialize;
pub mod permission_set;
pub mod ticket_list;
pub mod ticket_price;
pub mod ticket_prove;
pub mod ticket_purchase;
pub mod ticket_transfer;
pub mod value_delivery;

pub use event_create::*;
pub use event_sales::*;
pub use initialize::*;
pub use permission_set::*;
pub use ticket_list::*;
pub use ticket_price::*;
pub use ticket_prove::*;
pub use ticket_purchase::*;
pub use ticket_transfer::*;
pub use value_delivery::*;
