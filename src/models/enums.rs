use diesel::deserialize::{self, FromSql};
use diesel::serialize::{self, IsNull, Output, ToSql};
use diesel::sql_types::Text;
use diesel::sqlite::{Sqlite, SqliteValue};
use serde::{Deserialize, Serialize};

/// Declares an enum that is stored as a TEXT column and serialized as the same string
macro_rules! text_enum {
    ($(#[$meta:meta])* $name:ident { $($(#[$vmeta:meta])* $variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize,
            diesel::expression::AsExpression, diesel::deserialize::FromSqlRow,
        )]
        #[diesel(sql_type = Text)]
        pub enum $name {
            $(
                $(#[$vmeta])*
                #[serde(rename = $text)]
                $variant,
            )+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text,)+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($name::$variant),)+
                    other => Err(format!("Unknown {}: {}", stringify!($name), other)),
                }
            }
        }

        impl FromSql<Text, Sqlite> for $name {
            fn from_sql(value: SqliteValue<'_, '_, '_>) -> deserialize::Result<Self> {
                let text = <String as FromSql<Text, Sqlite>>::from_sql(value)?;
                text.parse::<$name>().map_err(Into::into)
            }
        }

        impl ToSql<Text, Sqlite> for $name {
            fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, Sqlite>) -> serialize::Result {
                out.set_value(self.as_str());
                Ok(IsNull::No)
            }
        }
    };
}

text_enum! {
    /// The three-tier role hierarchy
    Role {
        SuperAdmin => "SUPER_ADMIN",
        Owner => "OWNER",
        Worker => "WORKER",
    }
}

text_enum! {
    /// Lifecycle of an approval request. `Approved` and `Rejected` are terminal.
    ApprovalStatus {
        Pending => "PENDING",
        Approved => "APPROVED",
        Rejected => "REJECTED",
    }
}

text_enum! {
    /// The kinds of change a worker can ask an owner to sign off on
    RequestType {
        ProductUpdate => "PRODUCT_UPDATE",
        ProductDelete => "PRODUCT_DELETE",
        InventoryAdjustment => "INVENTORY_ADJUSTMENT",
    }
}

text_enum! {
    PaymentMethod {
        Cash => "CASH",
        Card => "CARD",
        BankTransfer => "BANK_TRANSFER",
        Easypaisa => "EASYPAISA",
        JazzCash => "JAZZCASH",
    }
}

text_enum! {
    /// How much of a purchase has been paid to the supplier
    PaymentStatus {
        Unpaid => "UNPAID",
        Partial => "PARTIAL",
        Paid => "PAID",
    }
}

impl ApprovalStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, ApprovalStatus::Pending)
    }
}

impl PaymentStatus {
    /// Derives the status from the amount paid so far against the total owed
    ///
    /// Both amounts are in paisa. Callers are expected to keep
    /// `0 <= paid <= total`.
    pub fn from_amounts(paid: i64, total: i64) -> Self {
        if paid <= 0 {
            PaymentStatus::Unpaid
        } else if paid >= total {
            PaymentStatus::Paid
        } else {
            PaymentStatus::Partial
        }
    }
}
