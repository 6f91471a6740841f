use serde::{Deserialize, Serialize};

macro_rules! numeric_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(
            Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord,
        )]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<i64> for $name {
            fn from(v: i64) -> Self {
                Self(v)
            }
        }
    };
}

numeric_id!(
    /// Server-assigned user id.
    UserId
);
numeric_id!(
    /// Chat room message id.
    MessageId
);
numeric_id!(
    /// Direct message id.
    DmId
);
numeric_id!(
    /// Forum category id.
    CategoryId
);
numeric_id!(
    /// Subforum id.
    SubforumId
);
numeric_id!(
    /// Forum topic id.
    TopicId
);
numeric_id!(
    /// Forum post id.
    PostId
);

/// Which direct-message box is being viewed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DmBox {
    Incoming,
    Outgoing,
}

impl DmBox {
    /// Path segment used by the REST collaborator (`/api/dmessages/incoming`).
    pub fn as_path(&self) -> &'static str {
        match self {
            DmBox::Incoming => "incoming",
            DmBox::Outgoing => "outgoing",
        }
    }
}
