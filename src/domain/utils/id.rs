use std::fmt;
use std::marker::PhantomData;

#[derive(PartialEq, Eq, PartialOrd, Ord, Clone, Hash)]
pub struct Id<T> {
    pub id: String,
    _marker: PhantomData<T>,
}

impl<T> Id<T> {
    pub fn new(id: impl Into<String>) -> Self {
        Id { id: id.into(), _marker: PhantomData }
    }

    pub fn as_str(&self) -> &str {
        &self.id
    }
}

impl<T> fmt::Display for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id)
    }
}

impl<T> From<Id<T>> for String {
    fn from(id_wrapper: Id<T>) -> Self {
        id_wrapper.id
    }
}

impl<T> From<&str> for Id<T> {
    fn from(id: &str) -> Self {
        Id::new(id)
    }
}

impl<T> fmt::Debug for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let full_name = std::any::type_name::<T>();
        let clean_name = full_name.split("::").last().unwrap_or(full_name);
        let display_name = clean_name.replace("Tag", "Id");

        write!(f, "{}: {:?}", display_name, self.id)
    }
}

#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone, Hash, Copy)]
pub struct ResourceTag;
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone, Hash, Copy)]
pub struct ClientTag;
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone, Hash, Copy)]
pub struct VehicleTag;
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone, Hash, Copy)]
pub struct BlockTag;

pub type ResourceName = Id<ResourceTag>;
pub type ClientId = Id<ClientTag>;
pub type VehicleId = Id<VehicleTag>;
pub type BlockId = Id<BlockTag>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_output_names_the_id_kind() {
        let client = ClientId::new("Vehicle-01");
        assert_eq!(format!("{:?}", client), "ClientId: \"Vehicle-01\"");
        assert_eq!(client.to_string(), "Vehicle-01");
    }

    #[test]
    fn ids_of_same_kind_compare_by_value() {
        assert_eq!(ResourceName::new("Point-0001"), ResourceName::from("Point-0001"));
        assert!(ResourceName::new("Point-0001") < ResourceName::new("Point-0002"));
    }
}
