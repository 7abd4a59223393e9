//! Categories that users file their transactions under.

mod create;
mod db;
mod domain;
mod list;

pub use create::create_category_endpoint;
pub use db::{
    category_belongs_to_user, create_category, create_category_table, get_categories_for_user,
};
pub use domain::{
    Category, CategoryForm, CategoryId, CategoryName, MAX_CATEGORY_NAME_LENGTH, NewCategory,
};
pub use list::list_categories_endpoint;
