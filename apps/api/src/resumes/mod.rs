// Resume delivery: uploads, signed-link resolution and local PDF serving.

pub mod handlers;
pub mod local;
