//! Element install: arrange a builder's elements before construction.
//!
//! Parameter elements are grouped by the executable they belong to. Consecutive
//! elements with the same executable key form one group; a group closes when
//! the key changes or when an index is claimed twice. Inside a group, indexed
//! elements take their index, unindexed elements fill the gaps in declaration
//! order and are appended after the last index; positions nobody claimed stay
//! empty.
//!
//! The first group that belongs to the build executable feeds Create; every
//! other group is a method injection run during Populate.

use std::sync::Arc;

use crate::builder::Builder;
use crate::core::{Result, WireError};
use crate::element::{Element, ExecutableRef, Slot};
use crate::meta::CONSTRUCTOR_NAME;

/// Highest parameter index an element may claim.
pub const MAX_PARAMETER_INDEX: usize = 254;

/// The ordered arguments of one call.
#[derive(Debug, Clone)]
pub struct ParameterGroup {
    executable: ExecutableRef,
    slots: Vec<Option<Arc<Element>>>,
}

impl ParameterGroup {
    /// The executable the arguments belong to.
    pub fn executable(&self) -> &ExecutableRef {
        &self.executable
    }

    /// Argument positions; `None` marks a gap.
    pub fn slots(&self) -> &[Option<Arc<Element>>] {
        &self.slots
    }

    /// Number of argument positions.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether the group has no positions.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

/// A builder's elements, arranged for the pipeline.
#[derive(Debug, Clone, Default)]
pub struct Installed {
    /// Arguments of the build executable.
    pub create: Option<ParameterGroup>,
    /// Method injections, in declaration order.
    pub injections: Vec<ParameterGroup>,
    /// Field elements, in declaration order.
    pub fields: Vec<Arc<Element>>,
}

/// Arrange the elements of `builder`.
///
/// # Errors
///
/// Returns a configuration error when an element claims an index above
/// [`MAX_PARAMETER_INDEX`].
pub fn install(builder: &Builder) -> Result<Installed> {
    let build_name = builder.build_executable_name();
    let mut installed = Installed::default();
    let mut groups: Vec<ParameterGroup> = Vec::new();
    let mut pending: Option<Pending> = None;

    for element in builder.elements() {
        match element.slot() {
            Slot::Parameter { executable, index } => {
                if let Some(index) = index.filter(|i| *i > MAX_PARAMETER_INDEX) {
                    return Err(WireError::config(format!(
                        "Parameter index {index} in builder '{}' exceeds the limit of {}",
                        builder.name(),
                        MAX_PARAMETER_INDEX
                    )));
                }
                let key = executable.key(build_name);
                let closes = pending.as_ref().is_some_and(|current| {
                    current.key != key
                        || index.is_some_and(|i| current.claimed.contains(&i))
                });
                if closes {
                    if let Some(done) = pending.take() {
                        groups.push(done.close());
                    }
                }
                let current = pending.get_or_insert_with(|| Pending::new(key, executable.clone()));
                if let Some(index) = index {
                    current.claimed.push(*index);
                }
                current.members.push((*index, Arc::clone(element)));
            }
            Slot::Field(_) => installed.fields.push(Arc::clone(element)),
            Slot::Nested => {}
        }
    }
    if let Some(done) = pending.take() {
        groups.push(done.close());
    }

    for group in groups {
        if installed.create.is_none() && is_build_group(builder, &group.executable) {
            installed.create = Some(group);
        } else {
            installed.injections.push(group);
        }
    }
    Ok(installed)
}

/// Whether `executable` names the executable `builder` constructs with.
fn is_build_group(builder: &Builder, executable: &ExecutableRef) -> bool {
    match executable {
        ExecutableRef::Build => true,
        ExecutableRef::Named(name) => name == builder.build_executable_name(),
        ExecutableRef::Explicit(explicit) => match builder.executable() {
            Some(own) => own.signature() == explicit.signature(),
            None => {
                explicit.name() == builder.build_executable_name()
                    && (explicit.name() != CONSTRUCTOR_NAME
                        || explicit.declaring_type() == builder.type_name())
            }
        },
    }
}

struct Pending {
    key: String,
    executable: ExecutableRef,
    claimed: Vec<usize>,
    members: Vec<(Option<usize>, Arc<Element>)>,
}

impl Pending {
    fn new(key: String, executable: ExecutableRef) -> Self {
        Self {
            key,
            executable,
            claimed: Vec::new(),
            members: Vec::new(),
        }
    }

    fn close(self) -> ParameterGroup {
        let width = self.claimed.iter().map(|i| i + 1).max().unwrap_or(0);
        let mut slots: Vec<Option<Arc<Element>>> = vec![None; width];
        let mut unindexed = Vec::new();

        for (index, element) in self.members {
            match index {
                Some(index) => slots[index] = Some(element),
                None => unindexed.push(element),
            }
        }

        let mut unindexed = unindexed.into_iter();
        for slot in slots.iter_mut().filter(|slot| slot.is_none()) {
            match unindexed.next() {
                Some(element) => *slot = Some(element),
                None => break,
            }
        }
        slots.extend(unindexed.map(Some));

        ParameterGroup {
            executable: self.executable,
            slots,
        }
    }
}
