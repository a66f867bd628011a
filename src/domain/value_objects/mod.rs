pub mod answer;
pub mod connectivity;
pub mod local_id;
pub mod work_order_status;

pub use answer::Answer;
pub use connectivity::Connectivity;
pub use local_id::LocalId;
pub use work_order_status::WorkOrderStatus;
