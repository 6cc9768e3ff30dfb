mod certificates_test;
mod resources_test;
mod test_utils;
