pub mod tests_users;
