use std::fmt;
use std::hash::Hash;

/// A closed set of field identifiers for one values type.
///
/// Implemented by the key enum generated with [`store_values!`](crate::store_values).
/// Every declared field has exactly one key, so an unknown key cannot be
/// constructed from typed code.
pub trait FieldKey: Copy + Eq + Hash + Ord + fmt::Debug + Send + Sync + 'static {
    /// All keys in declaration order.
    const ALL: &'static [Self];

    /// The field name this key identifies.
    fn name(self) -> &'static str;

    /// Look a key up by its field name.
    fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|key| key.name() == name)
    }
}

/// A struct of named fields that can live in a [`Store`](crate::Store).
///
/// `Field` is a tagged value, one variant per field, so a single field can be
/// read, written and carried around in a [`Patch`] without knowing its type
/// statically.
pub trait StoreValues: Clone + Send + Sync + 'static {
    type Key: FieldKey;
    type Field: Clone + fmt::Debug + PartialEq + Send + Sync + 'static;

    /// Clone out the value of one field.
    fn field(&self, key: Self::Key) -> Self::Field;

    /// Overwrite the field the tagged value belongs to.
    fn set_field(&mut self, field: Self::Field);

    /// The key a tagged value belongs to.
    fn key_of(field: &Self::Field) -> Self::Key;

    /// All keys of this values type.
    fn keys() -> &'static [Self::Key] {
        Self::Key::ALL
    }

    /// Field names of this values type in declaration order.
    fn key_names() -> Vec<&'static str> {
        Self::keys().iter().map(|key| key.name()).collect()
    }
}

/// A partial state: an ordered list of field values.
///
/// Applying a patch assigns its fields in order, so when the same field appears
/// twice the later value wins.
pub struct Patch<V: StoreValues> {
    fields: Vec<V::Field>,
}

impl<V: StoreValues> Patch<V> {
    pub fn new() -> Self {
        Self { fields: Vec::new() }
    }

    /// A patch that sets a single field.
    pub fn single(field: V::Field) -> Self {
        Self {
            fields: vec![field],
        }
    }

    /// Builder-style push.
    pub fn with(mut self, field: V::Field) -> Self {
        self.fields.push(field);
        self
    }

    pub fn push(&mut self, field: V::Field) {
        self.fields.push(field);
    }

    /// Append another patch; its fields override ours when applied.
    pub fn merge(&mut self, other: Patch<V>) {
        self.fields.extend(other.fields);
    }

    /// Project the given keys out of a full state.
    pub fn project(values: &V, keys: impl IntoIterator<Item = V::Key>) -> Self {
        keys.into_iter().map(|key| values.field(key)).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn fields(&self) -> &[V::Field] {
        &self.fields
    }

    /// Keys touched by this patch, in order, possibly repeated.
    pub fn keys(&self) -> impl Iterator<Item = V::Key> + '_ {
        self.fields.iter().map(V::key_of)
    }

    pub fn contains(&self, key: V::Key) -> bool {
        self.keys().any(|k| k == key)
    }

    /// Assign every field of the patch onto `values`.
    pub fn apply_to(&self, values: &mut V) {
        for field in &self.fields {
            values.set_field(field.clone());
        }
    }

    /// Consume the patch, assigning its fields onto `values`.
    pub fn apply_into(self, values: &mut V) {
        for field in self.fields {
            values.set_field(field);
        }
    }

    /// A copy of `base` with this patch applied.
    pub fn overlay(&self, base: &V) -> V {
        let mut next = base.clone();
        self.apply_to(&mut next);
        next
    }
}

impl<V: StoreValues> Default for Patch<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: StoreValues> Clone for Patch<V> {
    fn clone(&self) -> Self {
        Self {
            fields: self.fields.clone(),
        }
    }
}

impl<V: StoreValues> fmt::Debug for Patch<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.fields.iter()).finish()
    }
}

impl<V: StoreValues> PartialEq for Patch<V> {
    fn eq(&self, other: &Self) -> bool {
        self.fields == other.fields
    }
}

impl<V: StoreValues> FromIterator<V::Field> for Patch<V> {
    fn from_iter<I: IntoIterator<Item = V::Field>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}

impl<V: StoreValues> IntoIterator for Patch<V> {
    type Item = V::Field;
    type IntoIter = std::vec::IntoIter<V::Field>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.into_iter()
    }
}

/// Declare a values struct together with its key enum and tagged field enum.
///
/// ```
/// storekit::store_values! {
///     #[derive(Debug, PartialEq)]
///     pub struct Counter {
///         key CounterKey;
///         field CounterField;
///         count: i64 => Count,
///         label: String => Label,
///     }
/// }
///
/// use storekit::{FieldKey, StoreValues};
///
/// let mut counter = Counter { count: 0, label: "clicks".into() };
/// counter.set_field(CounterField::Count(3));
/// assert_eq!(counter.count, 3);
/// assert_eq!(CounterKey::Label.name(), "label");
/// ```
///
/// `Clone` is derived for the struct; do not list it again.
#[macro_export]
macro_rules! store_values {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            key $key:ident;
            field $field:ident;
            $( $(#[$fmeta:meta])* $fname:ident : $fty:ty => $variant:ident ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Clone)]
        $vis struct $name {
            $( $(#[$fmeta])* pub $fname: $fty, )+
        }

        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        $vis enum $key {
            $( $variant, )+
        }

        impl $crate::FieldKey for $key {
            const ALL: &'static [Self] = &[ $( $key::$variant, )+ ];

            fn name(self) -> &'static str {
                match self {
                    $( $key::$variant => stringify!($fname), )+
                }
            }
        }

        #[derive(Debug, Clone, PartialEq)]
        $vis enum $field {
            $( $variant($fty), )+
        }

        impl $crate::StoreValues for $name {
            type Key = $key;
            type Field = $field;

            fn field(&self, key: $key) -> $field {
                match key {
                    $( $key::$variant => $field::$variant(::std::clone::Clone::clone(&self.$fname)), )+
                }
            }

            fn set_field(&mut self, field: $field) {
                match field {
                    $( $field::$variant(value) => self.$fname = value, )+
                }
            }

            fn key_of(field: &$field) -> $key {
                match field {
                    $( $field::$variant(_) => $key::$variant, )+
                }
            }
        }
    };
}
