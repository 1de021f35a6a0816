//! Category - the closed set of inbound work classes
//!
//! Every unit of work handed to the dispatcher belongs to exactly one
//! category, and every category is served by its own worker pool.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Dispatch category
///
/// Used as a fixed index into per-category resources (see [`Category::index`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// Broadcast signals
    Signal,
    /// Error replies
    Error,
    /// Incoming method calls
    MethodCall,
    /// Replies to previously sent method calls
    MethodReturn,
}

impl Category {
    /// Number of categories
    pub const COUNT: usize = 4;

    /// All categories in their fixed iteration order
    pub const ALL: [Category; Category::COUNT] = [
        Category::Signal,
        Category::Error,
        Category::MethodCall,
        Category::MethodReturn,
    ];

    /// Position of this category inside [`Category::ALL`]
    #[inline]
    pub const fn index(self) -> usize {
        match self {
            Category::Signal => 0,
            Category::Error => 1,
            Category::MethodCall => 2,
            Category::MethodReturn => 3,
        }
    }

    /// Static diagnostic label
    pub const fn label(self) -> &'static str {
        match self {
            Category::Signal => "signal",
            Category::Error => "error",
            Category::MethodCall => "method-call",
            Category::MethodReturn => "method-return",
        }
    }

    /// Map a bus message-type code onto a category.
    ///
    /// Codes follow the message header layout: 1 = method call,
    /// 2 = method return, 3 = error, 4 = signal. Anything else is not a
    /// dispatchable category and yields `None`.
    pub const fn from_message_type(code: u8) -> Option<Self> {
        match code {
            1 => Some(Category::MethodCall),
            2 => Some(Category::MethodReturn),
            3 => Some(Category::Error),
            4 => Some(Category::Signal),
            _ => None,
        }
    }

    /// Whether a single worker is the default for this category.
    ///
    /// Single-worker pools keep arrival order; the method-call pool defaults
    /// to several workers so handlers can issue nested calls.
    pub const fn is_order_sensitive(self) -> bool {
        !matches!(self, Category::MethodCall)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
