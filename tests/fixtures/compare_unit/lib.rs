pub fn same(a: u8, b: u8) -> bool {
    a == b
}

pub fn below(a: u8, b: u8) -> bool {
    a < b
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_values() {
        assert!(same(3, 3));
        assert!(!same(3, 4));
    }
}
