use crate::runtime::errors::Trap;
use crate::runtime::FunctionAddress;
use crate::{Limit, TableType};

/// A table: a vector of function references, each either null or a function address.
/// Tables are fixed at their minimum size after instantiation;
/// their contents change only through element segments and host writes.
#[derive(Clone, Debug, PartialEq)]
pub struct TableInstance {
    elements: Vec<Option<FunctionAddress>>,
    limits: Limit,
}

impl TableInstance {
    /// Creates a new table of the minimum size of the given type, filled with null references.
    pub fn new(kind: TableType) -> Self {
        let limits = *kind.limits();

        TableInstance {
            elements: vec![None; limits.min() as usize],
            limits,
        }
    }

    /// The declared limits of this table.
    pub fn limits(&self) -> &Limit {
        &self.limits
    }

    /// The current number of elements in this table.
    pub fn size(&self) -> u32 {
        self.elements.len() as u32
    }

    /// The reference stored at the given index.
    pub fn get(&self, index: u32) -> Result<Option<FunctionAddress>, Trap> {
        self.elements
            .get(index as usize)
            .copied()
            .ok_or(Trap::OutOfBoundsTable)
    }

    /// Replaces the reference stored at the given index.
    pub fn set(&mut self, index: u32, reference: Option<FunctionAddress>) -> Result<(), Trap> {
        let slot = self
            .elements
            .get_mut(index as usize)
            .ok_or(Trap::OutOfBoundsTable)?;

        *slot = reference;

        Ok(())
    }

    /// Copies a range of an element segment into this table.
    /// Both the segment range and the destination range are validated before any write.
    pub fn init(
        &mut self,
        destination: u64,
        segment: &[Option<FunctionAddress>],
        source: u64,
        length: u64,
    ) -> Result<(), Trap> {
        let source_end = source.checked_add(length).ok_or(Trap::OutOfBoundsTable)?;

        if source_end > segment.len() as u64 {
            return Err(Trap::OutOfBoundsTable);
        }

        let destination_end = destination
            .checked_add(length)
            .ok_or(Trap::OutOfBoundsTable)?;

        if destination_end > self.elements.len() as u64 {
            return Err(Trap::OutOfBoundsTable);
        }

        self.elements[destination as usize..destination_end as usize]
            .copy_from_slice(&segment[source as usize..source_end as usize]);

        Ok(())
    }
}
