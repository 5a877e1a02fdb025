/// Build script for dx12_demos
///
/// # Shader Compilation Strategy:
/// - HLSL sources are embedded with `include_str!` and compiled at runtime via D3DCompile
/// - Rebuild whenever one of them changes so the embedded text stays current
fn main() {
    println!("cargo:rerun-if-changed=src/renderer/shaders/color.hlsl");
    println!("cargo:rerun-if-changed=src/renderer/shaders/default.hlsl");
    println!("cargo:rerun-if-changed=src/renderer/shaders/flare.hlsl");
    println!("cargo:rerun-if-changed=src/renderer/shaders/lighting_util.hlsl");
}
