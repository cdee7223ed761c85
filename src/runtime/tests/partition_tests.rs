//! Tests for splitting kernels into per-thread workers.

use super::{Kernel, PartitionDescriptor, THREAD_COUNT_PARAMETER, THREAD_ID_PARAMETER, partition_kernel};
use crate::compiler_frontend::ast::parse_module::parse_single_function;
use crate::compiler_frontend::compiler_errors::ErrorType;
use crate::compiler_frontend::compiler_warnings::WarningKind;
use crate::compiler_frontend::lowering::range_normalization::RangeTriple;
use proptest::prelude::*;

#[test]
fn worker_strides_the_governing_loop() {
    let definition = parse_single_function(
        "def fill(data):\n    for i in range(0, 10, 2):\n        data[i] = __thread_id + 1\n",
    )
    .expect("kernel should parse");

    let mut warnings = Vec::new();
    let partition = partition_kernel(&definition, &mut warnings)
        .expect("kernel should partition")
        .expect("kernel has a governing loop");

    assert!(warnings.is_empty());
    assert_eq!(partition.loop_variable, "i");
    assert_eq!(
        partition.worker.to_string(),
        "def fill(data, __thread_id=0, __thread_count=1):\n    for i in range(0 + __thread_id * 2, 10, 2 * __thread_count):\n        data[i] = __thread_id + 1\n"
    );

    let names: Vec<&str> = partition.worker.parameter_names().collect();
    assert_eq!(names, vec!["data", THREAD_ID_PARAMETER, THREAD_COUNT_PARAMETER]);
}

#[test]
fn single_argument_range_is_normalized() {
    let definition =
        parse_single_function("def k(n):\n    for i in range(n):\n        pass\n").expect("parses");

    let partition = partition_kernel(&definition, &mut Vec::new())
        .expect("partitions")
        .expect("has a loop");

    assert_eq!(partition.range.lower.to_string(), "0");
    assert_eq!(partition.range.upper.to_string(), "n");
    assert_eq!(partition.range.step.to_string(), "1");
}

#[test]
fn statements_outside_the_loop_are_ignored_with_warnings() {
    let source = "\
def k(data):
    x = 1
    for i in range(4):
        data[i] = x
    for j in range(2):
        pass
    return 5
";
    let definition = parse_single_function(source).expect("parses");

    let mut warnings = Vec::new();
    let partition = partition_kernel(&definition, &mut warnings)
        .expect("partitions")
        .expect("has a loop");

    assert_eq!(warnings.len(), 3);
    assert!(
        warnings
            .iter()
            .all(|w| w.warning_kind == WarningKind::IllegalKernelStatement)
    );
    assert_eq!(partition.worker.body.len(), 1);
    assert!(partition.worker.returns.is_none());
}

#[test]
fn kernel_without_a_range_loop_is_empty() {
    let definition =
        parse_single_function("def k(data):\n    data[0] = 1\n").expect("parses");

    let mut warnings = Vec::new();
    let kernel = Kernel::new(definition, &mut warnings).expect("builds");

    assert!(kernel.partition.is_none());
    assert!(
        warnings
            .iter()
            .any(|w| w.warning_kind == WarningKind::EmptyKernel)
    );
}

#[test]
fn loops_over_other_iterables_do_not_govern() {
    let definition =
        parse_single_function("def k(data):\n    for x in data:\n        pass\n").expect("parses");

    let mut warnings = Vec::new();
    let partition = partition_kernel(&definition, &mut warnings).expect("partitions");

    assert!(partition.is_none());
    assert_eq!(warnings.len(), 2);
}

#[test]
fn bad_range_arity_is_a_rule_error() {
    let definition =
        parse_single_function("def k():\n    for i in range(1, 2, 3, 4):\n        pass\n")
            .expect("parses");

    let error = partition_kernel(&definition, &mut Vec::new()).expect_err("four arguments");

    assert_eq!(error.error_type, ErrorType::Rule);
    assert_eq!(error.function_name(), Some("k"));
}

#[test]
fn called_names_are_collected_for_linking() {
    let definition = parse_single_function(
        "def k(data):\n    for i in range(len(data)):\n        data[i] = helper(i)\n",
    )
    .expect("parses");

    let partition = partition_kernel(&definition, &mut Vec::new())
        .expect("partitions")
        .expect("has a loop");

    assert!(partition.called_names.iter().any(|name| name == "helper"));
    assert!(partition.called_names.iter().any(|name| name == "range"));
}

#[test]
fn descriptors_interleave_the_range() {
    let range = RangeTriple {
        lower: 0,
        upper: 10,
        step: 2,
    };

    let first: Vec<i64> = PartitionDescriptor::new(range, 0, 2).indices().collect();
    let second: Vec<i64> = PartitionDescriptor::new(range, 1, 2).indices().collect();

    assert_eq!(first, vec![0, 4, 8]);
    assert_eq!(second, vec![2, 6]);
}

#[test]
fn more_threads_than_indices_leaves_some_idle() {
    let range = RangeTriple {
        lower: 0,
        upper: 2,
        step: 1,
    };

    let idle: Vec<i64> = PartitionDescriptor::new(range, 5, 8).indices().collect();
    assert!(idle.is_empty());
}

proptest! {
    #[test]
    fn shards_cover_the_range_exactly_once(
        lower in -500i64..500,
        upper in -500i64..500,
        step in prop_oneof![-17i64..=-1, 1i64..=17],
        thread_count in 1usize..9,
    ) {
        let range = RangeTriple { lower, upper, step };

        let mut covered: Vec<i64> = (0..thread_count)
            .flat_map(|thread_id| PartitionDescriptor::new(range, thread_id, thread_count).indices())
            .collect();
        covered.sort_unstable();

        let mut expected: Vec<i64> = range.iter().collect();
        expected.sort_unstable();

        prop_assert_eq!(covered, expected);
    }
}
