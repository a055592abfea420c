pub mod article_features;
pub mod article_prices;
pub mod articles;
pub mod audit_logs;
pub mod cart_items;
pub mod carts;
pub mod categories;
pub mod features;
pub mod orders;
pub mod users;

pub use article_features::Entity as ArticleFeatures;
pub use article_prices::Entity as ArticlePrices;
pub use articles::Entity as Articles;
pub use audit_logs::Entity as AuditLogs;
pub use cart_items::Entity as CartItems;
pub use carts::Entity as Carts;
pub use categories::Entity as Categories;
pub use features::Entity as Features;
pub use orders::Entity as Orders;
pub use users::Entity as Users;
