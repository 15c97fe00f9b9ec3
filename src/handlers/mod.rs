// handlers/mod.rs
//
// auth    - registration, login and the current principal
// crud    - list/show/create/update/destroy, generic over the resource body
// catalog - product ordering by path and reviews per service
// system  - service info and health
pub mod auth;
pub mod catalog;
pub mod crud;
pub mod system;
