use super::MemoryError;

/// Value stack, bottom first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Stack {
    values: Vec<i32>,
    capacity: usize,
}

impl Stack {
    pub fn new(capacity: usize) -> Self {
        Self {
            values: Vec::new(),
            capacity,
        }
    }

    pub fn push(&mut self, value: i32) -> Result<(), MemoryError> {
        if self.values.len() >= self.capacity {
            return Err(MemoryError::StackOverflow {
                capacity: self.capacity,
            });
        }
        self.values.push(value);
        Ok(())
    }

    pub fn pop(&mut self) -> Result<i32, MemoryError> {
        self.values.pop().ok_or(MemoryError::StackUnderflow)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Value of the stack pointer: counts down from `capacity` as values are
    /// pushed. Saturates at `i32::MAX` for capacities beyond a register.
    pub fn pointer(&self) -> i32 {
        i32::try_from(self.capacity - self.values.len()).unwrap_or(i32::MAX)
    }

    pub fn values(&self) -> &[i32] {
        &self.values
    }
}
