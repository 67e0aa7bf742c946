//! Read-only access to the solved values of a model.
//!
//! Two key schemes are supported. The indexed scheme names a variable and addresses it by a tuple
//! of index parts, where timed variables always lead with the timestep. The network scheme
//! addresses values by the flow between two nodes, plus a result attribute and (for sequences) a
//! position in the time index.
//!
//! Lookups of keys which are well formed but absent return `Ok(None)`, so callers can probe
//! alternative keys. Keys which are malformed are rejected with a [`KeyError`].
use crate::id::define_id_type;
use serde::Deserialize;
use std::fmt;
use std::rc::Rc;

pub mod indexed;
pub mod network;
pub use indexed::IndexedResults;
pub use network::NetworkResults;

define_id_type! {NodeLabel}

/// The key scheme used by a model's result store
#[derive(PartialEq, Eq, Clone, Copy, Debug, Deserialize, derive_more::Display)]
#[serde(rename_all = "lowercase")]
pub enum StoreFormat {
    /// Variables addressed by index tuples
    #[display("indexed")]
    Indexed,
    /// Values attached to flows between network nodes
    #[display("network")]
    Network,
}

/// A variable of the indexed model
#[derive(
    PartialEq, Eq, Hash, Clone, Copy, Debug, Deserialize, strum::Display, strum::EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum IndexedVariable {
    /// Process capacity: (site, process)
    CapPro,
    /// Storage content capacity: (site, storage, commodity)
    CapStoC,
    /// Storage power capacity: (site, storage, commodity)
    CapStoP,
    /// Transmission capacity: (site in, site out, transmission, commodity)
    CapTra,
    /// Process output: (step, site, process, commodity)
    EProOut,
    /// Storage charge: (step, site, storage, commodity)
    EStoIn,
    /// Storage discharge: (step, site, storage, commodity)
    EStoOut,
    /// Storage content: (step, site, storage, commodity)
    EStoCon,
    /// Transmission input: (step, site in, site out, transmission, commodity)
    ETraIn,
    /// Transmission output: (step, site in, site out, transmission, commodity)
    ETraOut,
}

impl IndexedVariable {
    /// The number of index parts the variable is addressed by
    pub fn arity(self) -> usize {
        match self {
            Self::CapPro => 2,
            Self::CapStoC | Self::CapStoP => 3,
            Self::CapTra | Self::EProOut | Self::EStoIn | Self::EStoOut | Self::EStoCon => 4,
            Self::ETraIn | Self::ETraOut => 5,
        }
    }

    /// Whether the variable has a time dimension
    pub fn is_timed(self) -> bool {
        !matches!(
            self,
            Self::CapPro | Self::CapStoC | Self::CapStoP | Self::CapTra
        )
    }
}

/// One part of an indexed key
#[derive(PartialEq, Eq, Hash, Clone, Debug)]
pub enum IndexPart {
    /// A timestep
    Step(u32),
    /// A site, technology or commodity name
    Name(Rc<str>),
}

impl fmt::Display for IndexPart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Step(step) => write!(f, "{step}"),
            Self::Name(name) => write!(f, "{name}"),
        }
    }
}

impl From<&str> for IndexPart {
    fn from(s: &str) -> Self {
        Self::Name(Rc::from(s))
    }
}

impl From<u32> for IndexPart {
    fn from(step: u32) -> Self {
        Self::Step(step)
    }
}

/// A result attribute of a flow in the network model
#[derive(
    PartialEq, Eq, Hash, Clone, Copy, Debug, Deserialize, strum::Display, strum::EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum NetworkAttribute {
    /// Flow along an edge, per step
    Flow,
    /// Storage content, per step
    Capacity,
    /// Invested capacity (scalar)
    Invest,
}

impl NetworkAttribute {
    /// Whether the attribute holds a value per step
    pub fn is_sequence(self) -> bool {
        !matches!(self, Self::Invest)
    }
}

/// A key into a model's result store
#[derive(PartialEq, Eq, Hash, Clone, Debug)]
pub enum ResultKey {
    /// A key for the indexed scheme
    Indexed {
        /// The variable name
        variable: IndexedVariable,
        /// The index tuple, leading with the timestep for timed variables
        index: Vec<IndexPart>,
    },
    /// A key for the network scheme
    Network {
        /// The node the flow leaves
        source: NodeLabel,
        /// The node the flow enters, or `None` for node-level results such as storage content
        target: Option<NodeLabel>,
        /// The requested attribute
        attribute: NetworkAttribute,
        /// Zero-based position in the time index for sequence attributes
        position: Option<usize>,
    },
}

impl ResultKey {
    /// The scheme this key belongs to
    pub fn format(&self) -> StoreFormat {
        match self {
            Self::Indexed { .. } => StoreFormat::Indexed,
            Self::Network { .. } => StoreFormat::Network,
        }
    }
}

impl fmt::Display for ResultKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Indexed { variable, index } => {
                let parts: Vec<_> = index.iter().map(ToString::to_string).collect();
                write!(f, "{variable}[({})]", parts.join(", "))
            }
            Self::Network {
                source,
                target,
                attribute,
                position,
            } => {
                let target = target.as_ref().map_or("None", |t| &*t.0);
                write!(f, "(({source}, {target}), {attribute})")?;
                if let Some(position) = position {
                    write!(f, "[{position}]")?;
                }
                Ok(())
            }
        }
    }
}

/// A key which is malformed for the store it is used against.
///
/// This indicates a programming error rather than missing data.
#[derive(PartialEq, Eq, Debug, derive_more::Display)]
pub enum KeyError {
    /// An indexed key with the wrong number of parts
    #[display("Variable {variable} takes {expected} index parts but {found} were given")]
    WrongArity {
        /// The variable being looked up
        variable: IndexedVariable,
        /// The variable's arity
        expected: usize,
        /// The number of parts supplied
        found: usize,
    },
    /// A timed indexed key whose first part is not a timestep
    #[display("Variable {_0} must be indexed by a timestep first")]
    MissingStep(IndexedVariable),
    /// An untimed indexed key containing a timestep
    #[display("Variable {_0} cannot be indexed by a timestep")]
    UnexpectedStep(IndexedVariable),
    /// A sequence attribute without a position
    #[display("Attribute {_0} is a sequence and requires a position")]
    MissingPosition(NetworkAttribute),
    /// A scalar attribute with a position
    #[display("Attribute {_0} is a scalar and cannot take a position")]
    UnexpectedPosition(NetworkAttribute),
    /// A key of one scheme used against a store of the other
    #[display("Cannot look up a {key} key in {store} results")]
    WrongScheme {
        /// The scheme of the store
        store: StoreFormat,
        /// The scheme of the key
        key: StoreFormat,
    },
}

impl std::error::Error for KeyError {}

/// The solved values of a model, in one of the two supported schemes
#[derive(PartialEq, Debug, Clone)]
pub enum ResultStore {
    /// Results of an indexed model
    Indexed(IndexedResults),
    /// Results of a network model
    Network(NetworkResults),
}

impl ResultStore {
    /// The scheme used by this store
    pub fn format(&self) -> StoreFormat {
        match self {
            Self::Indexed(_) => StoreFormat::Indexed,
            Self::Network(_) => StoreFormat::Network,
        }
    }

    /// The number of modelled timesteps
    pub fn timestep_count(&self) -> u32 {
        match self {
            Self::Indexed(results) => results.timestep_count(),
            Self::Network(results) => results.timestep_count(),
        }
    }

    /// Look up a single value.
    ///
    /// # Returns
    ///
    /// `Ok(Some(value))` if found, `Ok(None)` if the key is well formed but absent, or a
    /// [`KeyError`] if the key is malformed.
    pub fn lookup(&self, key: &ResultKey) -> Result<Option<f64>, KeyError> {
        match (self, key) {
            (Self::Indexed(results), ResultKey::Indexed { variable, index }) => {
                results.lookup(*variable, index)
            }
            (
                Self::Network(results),
                ResultKey::Network {
                    source,
                    target,
                    attribute,
                    position,
                },
            ) => results.lookup(source, target.as_ref(), *attribute, *position),
            _ => Err(KeyError::WrongScheme {
                store: self.format(),
                key: key.format(),
            }),
        }
    }
}
