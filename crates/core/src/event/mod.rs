mod bus;

pub use bus::{EventBus, Observer, Subscription};
