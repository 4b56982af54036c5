//! Property-based tests for platform identification.

use proptest::prelude::*;

use signapk_bootstrap::native;
use signapk_bootstrap::platform::{identify, ArchFamily, OsFamily};

/// OS names built from letters that cannot spell any recognized family.
fn unknown_os_name() -> impl Strategy<Value = String> {
    "[qwyz0-9_]{1,16}"
}

fn arch_name() -> impl Strategy<Value = &'static str> {
    prop::sample::select(vec![
        "aarch64", "arm64", "amd64", "x86_64", "x86", "i686", "armv7l", "riscv64",
    ])
}

fn random_case(raw: &str, mask: &[bool]) -> String {
    raw.chars()
        .zip(mask.iter().cycle())
        .map(|(c, upper)| if *upper { c.to_ascii_uppercase() } else { c })
        .collect()
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 64,
        max_shrink_iters: 200,
        ..ProptestConfig::default()
    })]

    /// An unrecognized OS never identifies, whatever the architecture.
    #[test]
    fn unknown_os_never_identifies(os in unknown_os_name(), arch in arch_name()) {
        prop_assert_eq!(identify(&os, arch), None);
    }

    /// Identification ignores case.
    #[test]
    fn identification_ignores_case(
        arch in arch_name(),
        mask in prop::collection::vec(any::<bool>(), 1..8),
    ) {
        let lower = identify("linux", arch);
        prop_assert!(lower.is_some());
        prop_assert_eq!(identify(&random_case("linux", &mask), &random_case(arch, &mask)), lower);
    }

    /// Every packaged platform is reachable from its canonical names.
    #[test]
    fn packaged_platforms_identify(index in 0usize..4) {
        let signature = native::supported_signatures().nth(index).unwrap();
        let again = identify(signature.os.as_str(), signature.arch.as_str());
        prop_assert_eq!(again, Some(signature));
        prop_assert!(native::lookup(signature).is_some());
    }
}

#[test]
fn canonical_names_parse_back() {
    for os in [OsFamily::Linux, OsFamily::MacOs, OsFamily::Windows] {
        assert_eq!(OsFamily::parse(os.as_str()), Some(os));
    }
    for arch in [
        ArchFamily::Aarch64,
        ArchFamily::X86_64,
        ArchFamily::X86,
        ArchFamily::Arm,
        ArchFamily::Riscv64,
        ArchFamily::Ppc64le,
        ArchFamily::S390x,
    ] {
        assert_eq!(ArchFamily::parse(arch.as_str()), Some(arch));
    }
}
