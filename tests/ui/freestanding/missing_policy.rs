use awkernel_conc::critical_section;

struct Uart;

fn answer() -> u32 {
    17
}

fn main() {
    critical_section::run_exclusive::<Uart, fn() -> u32, u32>(answer);
}
