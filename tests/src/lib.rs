

#[cfg(test)]
mod ironic_tests;
