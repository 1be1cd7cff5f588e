//! Page and fragment rendering.
//!
//! Every function here is a pure projection from catalog data and cart state
//! to a template. Nothing in this module reads storage or mutates the cart;
//! the add/remove/checkout controls in the markup post to the cart routes.

use askama::Template;
use askama_web::WebTemplate;
use innovatemart_core::{Cart, CartLine, Product};

use crate::filters;

/// Description shown on the detail page when the catalog has none.
pub const DEFAULT_DESCRIPTION: &str = "A great product.";

// =============================================================================
// View Models
// =============================================================================

/// Product display data for templates.
#[derive(Debug, Clone)]
pub struct ProductView {
    pub id: String,
    pub name: String,
    pub description: String,
    pub price: String,
    pub detail_href: String,
}

impl ProductView {
    /// Description for the detail page, falling back to a stock blurb.
    #[must_use]
    pub fn description_or_default(&self) -> &str {
        if self.description.is_empty() {
            DEFAULT_DESCRIPTION
        } else {
            &self.description
        }
    }
}

impl From<&Product> for ProductView {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id.to_string(),
            name: product.name.clone(),
            description: product.description.clone().unwrap_or_default(),
            price: product.price.display(),
            detail_href: format!(
                "/product.html?id={}",
                urlencoding::encode(product.id.as_str())
            ),
        }
    }
}

/// Cart line display data for templates.
#[derive(Debug, Clone)]
pub struct CartLineView {
    pub id: String,
    pub name: String,
    pub quantity: u32,
    pub price: String,
    pub subtotal: String,
}

impl From<&CartLine> for CartLineView {
    fn from(line: &CartLine) -> Self {
        Self {
            id: line.id.to_string(),
            name: line.name.clone(),
            quantity: line.quantity,
            price: line.price.display(),
            subtotal: line.subtotal().display(),
        }
    }
}

/// Cart display data for templates.
#[derive(Debug, Clone)]
pub struct CartView {
    pub lines: Vec<CartLineView>,
    pub total: String,
    pub item_count: u64,
}

impl From<&Cart> for CartView {
    fn from(cart: &Cart) -> Self {
        Self {
            lines: cart.items.iter().map(CartLineView::from).collect(),
            total: cart.total().display(),
            item_count: cart.item_count(),
        }
    }
}

/// Severity of a user-facing notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Error,
}

impl NoticeKind {
    /// CSS class for the notice box.
    #[must_use]
    pub const fn css_class(self) -> &'static str {
        match self {
            Self::Success => "notice notice-success",
            Self::Error => "notice notice-error",
        }
    }
}

/// A message shown to the shopper after an action.
#[derive(Debug, Clone)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
}

impl Notice {
    #[must_use]
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Success,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Error,
            message: message.into(),
        }
    }
}

// =============================================================================
// Templates
// =============================================================================

/// Product grid page.
#[derive(Template, WebTemplate)]
#[template(path = "products/index.html")]
pub struct ProductsIndexTemplate {
    pub products: Vec<ProductView>,
    pub error: Option<String>,
    pub cart_count: u64,
}

/// Product detail page.
#[derive(Template, WebTemplate)]
#[template(path = "products/show.html")]
pub struct ProductShowTemplate {
    pub product: Option<ProductView>,
    pub error: Option<String>,
    pub cart_count: u64,
}

/// Cart page.
#[derive(Template, WebTemplate)]
#[template(path = "cart/show.html")]
pub struct CartShowTemplate {
    pub cart: CartView,
    pub notice: Option<Notice>,
    pub cart_count: u64,
}

/// Cart panel fragment (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_panel.html")]
pub struct CartPanelTemplate {
    pub cart: CartView,
}

/// Cart count badge fragment (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_count.html")]
pub struct CartCountTemplate {
    pub cart_count: u64,
}

/// Notice fragment (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/notice.html")]
pub struct NoticeTemplate {
    pub notice: Notice,
}

// =============================================================================
// Projections
// =============================================================================

/// Product grid: one card per product.
#[must_use]
pub fn product_list(products: &[Product], cart: &Cart) -> ProductsIndexTemplate {
    ProductsIndexTemplate {
        products: products.iter().map(ProductView::from).collect(),
        error: None,
        cart_count: cart.item_count(),
    }
}

/// Product grid replaced by a load failure message.
#[must_use]
pub fn catalog_unavailable(error: &impl std::fmt::Display, cart: &Cart) -> ProductsIndexTemplate {
    ProductsIndexTemplate {
        products: Vec::new(),
        error: Some(format!("Failed to load catalog: {error}")),
        cart_count: cart.item_count(),
    }
}

/// Product detail, or the not-found message when `product` is `None`.
#[must_use]
pub fn product_detail(product: Option<&Product>, cart: &Cart) -> ProductShowTemplate {
    ProductShowTemplate {
        product: product.map(ProductView::from),
        error: None,
        cart_count: cart.item_count(),
    }
}

/// Product detail replaced by a load failure message.
#[must_use]
pub fn product_detail_unavailable(
    error: &impl std::fmt::Display,
    cart: &Cart,
) -> ProductShowTemplate {
    ProductShowTemplate {
        product: None,
        error: Some(format!("Error: {error}")),
        cart_count: cart.item_count(),
    }
}

/// Cart count badge: sum of all line quantities.
#[must_use]
pub fn cart_count(cart: &Cart) -> CartCountTemplate {
    CartCountTemplate {
        cart_count: cart.item_count(),
    }
}

/// Cart panel with per-line subtotals.
#[must_use]
pub fn cart_panel(cart: &Cart) -> CartPanelTemplate {
    CartPanelTemplate {
        cart: CartView::from(cart),
    }
}

/// Full cart page, optionally with a notice from the last action.
#[must_use]
pub fn cart_page(cart: &Cart, notice: Option<Notice>) -> CartShowTemplate {
    CartShowTemplate {
        cart: CartView::from(cart),
        notice,
        cart_count: cart.item_count(),
    }
}

/// Stand-alone notice.
#[must_use]
pub const fn notice(notice: Notice) -> NoticeTemplate {
    NoticeTemplate { notice }
}
