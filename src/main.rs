use ipc_dispatch::app::startup::startup;

fn main() {
    std::process::exit(startup());
}
