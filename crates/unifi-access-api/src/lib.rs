// unifi-access-api: Async Rust client for the UniFi Access developer API

pub mod client;
pub mod config;
pub mod error;
pub mod models;
pub mod resources;
pub mod retry;
pub mod transport;
pub mod websocket;

pub use client::AccessClient;
pub use config::{ClientConfig, DEFAULT_PORT};
pub use error::{Error, ErrorKind};
pub use models::{
    AccessPolicy, Device, DeviceType, Door, DoorGroup, DoorPosition, LockStatus, NewAccessPolicy,
    NewDoorGroup, NewNfcCard, NewUser, NewVisitor, NfcCard, PinCode, ResourceRef, ResourceType,
    User, UserStatus, Visitor, VisitorStatus, VisitorUpdate,
};
pub use resources::ListParams;
pub use retry::{Backoff, RetryPolicy};
pub use transport::{TlsMode, TransportConfig};
pub use websocket::{Notification, NotificationKind, NotificationStream, ReconnectConfig};
