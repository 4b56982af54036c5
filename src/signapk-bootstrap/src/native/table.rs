//! Static table of bundled native libraries.

use serde::Serialize;

use crate::platform::{ArchFamily, OsFamily, PlatformSignature};

/// File name of the Conscrypt JNI library on every supported platform.
pub const CONSCRYPT_LIBRARY: &str = "libconscrypt_jni.so";

/// Location of one bundled native library.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NativeLibraryDescriptor {
    /// Path of the resource inside the bundle, `/`-separated, no leading slash.
    pub resource_path: &'static str,
    /// File name the library is extracted under.
    pub file_name: &'static str,
}

const fn linux(arch: ArchFamily) -> PlatformSignature {
    PlatformSignature::new(OsFamily::Linux, arch)
}

/// Supported signatures and their bundled library, keyed by Android ABI.
pub static NATIVE_LIBRARIES: [(PlatformSignature, NativeLibraryDescriptor); 4] = [
    (
        linux(ArchFamily::Aarch64),
        NativeLibraryDescriptor {
            resource_path: "jni/arm64-v8a/libconscrypt_jni.so",
            file_name: CONSCRYPT_LIBRARY,
        },
    ),
    (
        linux(ArchFamily::X86_64),
        NativeLibraryDescriptor {
            resource_path: "jni/x86_64/libconscrypt_jni.so",
            file_name: CONSCRYPT_LIBRARY,
        },
    ),
    (
        linux(ArchFamily::X86),
        NativeLibraryDescriptor {
            resource_path: "jni/x86/libconscrypt_jni.so",
            file_name: CONSCRYPT_LIBRARY,
        },
    ),
    (
        linux(ArchFamily::Arm),
        NativeLibraryDescriptor {
            resource_path: "jni/armeabi-v7a/libconscrypt_jni.so",
            file_name: CONSCRYPT_LIBRARY,
        },
    ),
];

/// Look up the bundled library for a signature.
///
/// Recognized signatures without a packaged library (e.g. `linux/riscv64`)
/// return `None`.
pub fn lookup(signature: PlatformSignature) -> Option<&'static NativeLibraryDescriptor> {
    NATIVE_LIBRARIES
        .iter()
        .find(|(sig, _)| *sig == signature)
        .map(|(_, descriptor)| descriptor)
}

/// Iterate over every supported signature.
pub fn supported_signatures() -> impl Iterator<Item = PlatformSignature> {
    NATIVE_LIBRARIES.iter().map(|(sig, _)| *sig)
}
