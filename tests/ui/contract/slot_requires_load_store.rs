use awkernel_conc::atomic_slot;

struct NotAPolicy;

struct Board;
atomic_slot!(Board => NotAPolicy = NotAPolicy);

fn main() {}
