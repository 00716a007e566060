pub mod lifecycle;
pub mod maintenance;
pub mod redeem_link;
pub mod request_link;
