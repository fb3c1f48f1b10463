use std::env;

fn main() {
    // 告诉 cargo 在 build.rs 变化时重新运行
    println!("cargo:rerun-if-changed=build.rs");

    // 主机测试 (x86_64 等) 不需要 esp-hal 链接脚本
    let arch = env::var("CARGO_CFG_TARGET_ARCH").unwrap_or_default();
    if arch != "xtensa" {
        return;
    }

    // esp-hal 1.0 提供 linkall.x，只对固件二进制生效
    println!("cargo:rustc-link-arg-bins=-Tlinkall.x");
}
