//! List operations over pair chains and vectorized lists.
//!
//! Every operation is total: applied to a value that is not list-shaped it
//! yields Nil rather than failing, which is what lets `cadr`-style accessors
//! probe forms of unknown shape. Vectorized lists behave exactly like the
//! proper list of their elements, with O(1) `nth` and `length`.

use crate::{
    heap::{Heap, HeapData, Pair},
    value::Value,
};

pub(crate) fn cons(heap: &mut Heap, car: Value, cdr: Value) -> Value {
    Value::Ref(heap.allocate(HeapData::Pair(Pair { car, cdr })))
}

/// First element: Nil for Nil, `car` for a pair, element 0 for a non-empty
/// vectorized list, Nil for anything else.
pub(crate) fn car(heap: &Heap, v: Value) -> Value {
    match v {
        Value::Ref(id) => match heap.get(id) {
            HeapData::Pair(pair) => pair.car,
            HeapData::Vector(items) => items.first().copied().unwrap_or(Value::Nil),
            _ => Value::Nil,
        },
        _ => Value::Nil,
    }
}

/// Rest of the list. For a vectorized list the tail is materialized as a
/// fresh vector sharing the element values.
pub(crate) fn cdr(heap: &mut Heap, v: Value) -> Value {
    match v {
        Value::Ref(id) => match heap.get(id) {
            HeapData::Pair(pair) => pair.cdr,
            HeapData::Vector(items) => {
                if items.len() <= 1 {
                    Value::Nil
                } else {
                    let tail = items[1..].to_vec();
                    Value::Ref(heap.allocate(HeapData::Vector(tail)))
                }
            }
            _ => Value::Nil,
        },
        _ => Value::Nil,
    }
}

/// Applies a string of `a`/`d` steps, consumed right-to-left, so path
/// `"ad"` is `car(cdr(x))`. Any non-pair, non-vector intermediate yields
/// Nil.
pub(crate) fn walk_list(heap: &mut Heap, v: Value, path: &str) -> Value {
    let mut cur = v;
    for step in path.bytes().rev() {
        let shaped = matches!(
            cur,
            Value::Ref(id) if matches!(heap.get(id), HeapData::Pair(_) | HeapData::Vector(_))
        );
        if !shaped {
            return Value::Nil;
        }
        cur = match step {
            b'a' => car(heap, cur),
            b'd' => cdr(heap, cur),
            _ => Value::Nil,
        };
    }
    cur
}

pub(crate) fn cadr(heap: &mut Heap, v: Value) -> Value {
    walk_list(heap, v, "ad")
}

pub(crate) fn caddr(heap: &mut Heap, v: Value) -> Value {
    walk_list(heap, v, "add")
}

pub(crate) fn cddr(heap: &mut Heap, v: Value) -> Value {
    walk_list(heap, v, "dd")
}

/// Number of elements. O(1) for vectorized lists, O(n) on pair chains; a
/// dotted terminator counts as a final element.
pub(crate) fn length(heap: &Heap, v: Value) -> usize {
    match v {
        Value::Ref(id) => match heap.get(id) {
            HeapData::Vector(items) => items.len(),
            HeapData::Pair(_) => {
                let mut count = 0;
                let mut cur = v;
                loop {
                    match cur {
                        Value::Nil => return count,
                        Value::Ref(pid) => match heap.get(pid) {
                            HeapData::Pair(pair) => {
                                count += 1;
                                cur = pair.cdr;
                            }
                            _ => return count + 1,
                        },
                        _ => return count + 1,
                    }
                }
            }
            _ => 0,
        },
        _ => 0,
    }
}

/// Zero-based element access; Nil when out of range or negative.
pub(crate) fn nth(heap: &Heap, v: Value, n: i64) -> Value {
    if v.is_nil() || n < 0 {
        return Value::Nil;
    }
    let n = usize::try_from(n).expect("non-negative index");
    if n >= length(heap, v) {
        return Value::Nil;
    }
    if let Value::Ref(id) = v
        && let HeapData::Vector(items) = heap.get(id)
    {
        return items[n];
    }
    let mut cur = v;
    for _ in 0..n {
        cur = match cur {
            Value::Ref(id) => match heap.get(id) {
                HeapData::Pair(pair) => pair.cdr,
                _ => return Value::Nil,
            },
            _ => return Value::Nil,
        };
    }
    car(heap, cur)
}

/// Mutates the i-th element in place and returns the stored value. Out of
/// range is a silent no-op (the value is still returned).
pub(crate) fn set_nth(heap: &mut Heap, list: Value, index: i64, value: Value) -> Value {
    let Ok(index) = usize::try_from(index) else {
        return value;
    };
    let Value::Ref(id) = list else { return value };
    match heap.get(id) {
        HeapData::Vector(_) => {
            if let HeapData::Vector(items) = heap.get_mut(id)
                && index < items.len()
            {
                items[index] = value;
            }
        }
        HeapData::Pair(_) => {
            let mut cur = id;
            for _ in 0..index {
                match heap.get(cur) {
                    HeapData::Pair(pair) => match pair.cdr {
                        Value::Ref(next) if matches!(heap.get(next), HeapData::Pair(_)) => cur = next,
                        _ => return value,
                    },
                    _ => return value,
                }
            }
            if let HeapData::Pair(pair) = heap.get_mut(cur) {
                pair.car = value;
            }
        }
        _ => {}
    }
    value
}

/// Builds a proper list from a slice.
pub(crate) fn array_to_list(heap: &mut Heap, items: &[Value]) -> Value {
    array_to_list_with_tail(heap, items, Value::Nil)
}

/// Builds a pair spine over `items` ending in `tail` (shared, not copied).
pub(crate) fn array_to_list_with_tail(heap: &mut Heap, items: &[Value], tail: Value) -> Value {
    let mut result = tail;
    for &item in items.iter().rev() {
        result = cons(heap, item, result);
    }
    result
}

/// Appends two lists: a fresh spine over the elements of `a`, sharing `b`
/// as its tail.
pub(crate) fn append(heap: &mut Heap, a: Value, b: Value) -> Value {
    let items = elements(heap, a);
    array_to_list_with_tail(heap, &items, b)
}

/// Collects the elements of a list-shaped value into a Vec. A dotted
/// terminator is dropped; non-list values yield an empty Vec.
pub(crate) fn elements(heap: &Heap, v: Value) -> Vec<Value> {
    let mut out = Vec::new();
    match v {
        Value::Ref(id) => match heap.get(id) {
            HeapData::Vector(items) => out.extend_from_slice(items),
            HeapData::Pair(_) => {
                let mut cur = v;
                while let Value::Ref(pid) = cur {
                    let HeapData::Pair(pair) = heap.get(pid) else { break };
                    out.push(pair.car);
                    cur = pair.cdr;
                }
            }
            _ => {}
        },
        _ => {}
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list3(heap: &mut Heap) -> Value {
        let items = [Value::Integer(1), Value::Integer(2), Value::Integer(3)];
        array_to_list(heap, &items)
    }

    #[test]
    fn walk_list_matches_composition() {
        let mut heap = Heap::new();
        let l = list3(&mut heap);
        let ad = walk_list(&mut heap, l, "ad");
        let cdr1 = cdr(&mut heap, l);
        assert_eq!(ad, car(&heap, cdr1));
        assert_eq!(ad, Value::Integer(2));
    }

    #[test]
    fn walk_list_dead_ends_on_atoms() {
        let mut heap = Heap::new();
        assert_eq!(walk_list(&mut heap, Value::Nil, "ad"), Value::Nil);
        assert_eq!(walk_list(&mut heap, Value::Integer(5), "a"), Value::Nil);
        let l = list3(&mut heap);
        assert_eq!(walk_list(&mut heap, l, "dddd"), Value::Nil);
    }

    #[test]
    fn nth_bounds() {
        let mut heap = Heap::new();
        let l = list3(&mut heap);
        assert_eq!(nth(&heap, l, 0), Value::Integer(1));
        assert_eq!(nth(&heap, l, 2), Value::Integer(3));
        assert_eq!(nth(&heap, l, 3), Value::Nil);
        assert_eq!(nth(&heap, l, -1), Value::Nil);
    }

    #[test]
    fn vector_behaves_like_list() {
        let mut heap = Heap::new();
        let v = Value::Ref(heap.allocate(HeapData::Vector(vec![
            Value::Integer(10),
            Value::Integer(20),
        ])));
        assert_eq!(car(&heap, v), Value::Integer(10));
        assert_eq!(nth(&heap, v, 1), Value::Integer(20));
        assert_eq!(length(&heap, v), 2);
        let tail = cdr(&mut heap, v);
        assert_eq!(car(&heap, tail), Value::Integer(20));
        assert_eq!(cdr(&mut heap, tail), Value::Nil);
    }

    #[test]
    fn set_nth_mutates_in_place() {
        let mut heap = Heap::new();
        let l = list3(&mut heap);
        let returned = set_nth(&mut heap, l, 1, Value::Integer(99));
        assert_eq!(returned, Value::Integer(99));
        assert_eq!(nth(&heap, l, 1), Value::Integer(99));
        // out of range: returned but not stored
        assert_eq!(set_nth(&mut heap, l, 9, Value::Integer(0)), Value::Integer(0));
        assert_eq!(length(&heap, l), 3);
    }

    #[test]
    fn append_shares_second_tail() {
        let mut heap = Heap::new();
        let a = array_to_list(&mut heap, &[Value::Integer(1)]);
        let b = list3(&mut heap);
        let joined = append(&mut heap, a, b);
        assert_eq!(length(&heap, joined), 4);
        // the second list's spine is shared, not copied
        assert_eq!(cdr(&mut heap, joined), b);
    }
}
