mod auth_tests;
pub(crate) mod test_utils;
