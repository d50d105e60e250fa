//! Maps category names to the colour and icon they are displayed with.

use serde::Serialize;

/// The name given to transactions without a category.
pub const UNCATEGORIZED_LABEL: &str = "Other";

/// The categories with their own colour and icon.
///
/// Any other name, including [UNCATEGORIZED_LABEL], maps to
/// [Category::Default].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Category {
    Comida,
    Transporte,
    Entretenimiento,
    Salud,
    Educacion,
    Servicios,
    Compras,
    Hogar,
    Salario,
    Default,
}

impl Category {
    /// The known categories in display order.
    pub const KNOWN: [Category; 9] = [
        Category::Comida,
        Category::Transporte,
        Category::Entretenimiento,
        Category::Salud,
        Category::Educacion,
        Category::Servicios,
        Category::Compras,
        Category::Hogar,
        Category::Salario,
    ];

    /// Look up a category by name, ignoring case and surrounding whitespace.
    pub fn from_name(name: &str) -> Self {
        let name = name.trim().to_lowercase();

        Self::KNOWN
            .into_iter()
            .find(|category| {
                category.name().to_lowercase() == name
                    || category.alias().is_some_and(|alias| alias == name)
            })
            .unwrap_or(Category::Default)
    }

    /// The canonical display name.
    pub fn name(self) -> &'static str {
        match self {
            Category::Comida => "Comida",
            Category::Transporte => "Transporte",
            Category::Entretenimiento => "Entretenimiento",
            Category::Salud => "Salud",
            Category::Educacion => "Educación",
            Category::Servicios => "Servicios",
            Category::Compras => "Compras",
            Category::Hogar => "Hogar",
            Category::Salario => "Salario",
            Category::Default => UNCATEGORIZED_LABEL,
        }
    }

    /// The chart colour as a CSS hex string.
    pub fn color(self) -> &'static str {
        match self {
            Category::Comida => "#FF6384",
            Category::Transporte => "#36A2EB",
            Category::Entretenimiento => "#FFCE56",
            Category::Salud => "#4BC0C0",
            Category::Educacion => "#9966FF",
            Category::Servicios => "#FF9F40",
            Category::Compras => "#E7E9ED",
            Category::Hogar => "#8D6E63",
            Category::Salario => "#66BB6A",
            Category::Default => "#C9CBCF",
        }
    }

    pub fn icon(self) -> &'static str {
        match self {
            Category::Comida => "🍔",
            Category::Transporte => "🚗",
            Category::Entretenimiento => "🎬",
            Category::Salud => "💊",
            Category::Educacion => "📚",
            Category::Servicios => "💡",
            Category::Compras => "🛍️",
            Category::Hogar => "🏠",
            Category::Salario => "💰",
            Category::Default => "📦",
        }
    }

    /// A lowercase alternative spelling, typed without the accent.
    fn alias(self) -> Option<&'static str> {
        match self {
            Category::Educacion => Some("educacion"),
            _ => None,
        }
    }
}

/// The colour for the category called `name`.
pub fn color_of(name: &str) -> &'static str {
    Category::from_name(name).color()
}

/// The icon for the category called `name`.
pub fn icon_of(name: &str) -> &'static str {
    Category::from_name(name).icon()
}
