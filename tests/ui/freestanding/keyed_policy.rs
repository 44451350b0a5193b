use awkernel_conc::{
    critical_section::{self, SpinCriticalSection},
    critical_section_slot,
};

struct Board;
critical_section_slot!(Board => SpinCriticalSection = SpinCriticalSection::new());

struct Uart;

fn main() {
    let v = critical_section::run_exclusive_in::<Board, Uart, _, _>(|| 17);
    assert_eq!(v, 17);
}
