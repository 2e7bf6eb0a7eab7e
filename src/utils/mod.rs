pub mod html;
pub mod http;
pub mod logging;

#[cfg(test)]
pub(crate) mod test_server;
