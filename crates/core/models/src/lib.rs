#[macro_use]
extern crate serde;

macro_rules! auto_derived {
    ( $( $item:item )+ ) => {
        $(
            #[derive(Serialize, Deserialize, Debug, Clone, PartialEq, utoipa::ToSchema)]
            $item
        )+
    };
}

pub mod v0;

/// Utility function to check if a string is empty
pub fn if_empty(t: &str) -> bool {
    t.is_empty()
}
