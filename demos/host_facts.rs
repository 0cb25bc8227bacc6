use hostfacts::{format_size, Collector, ConnectionFilter};

fn main() -> hostfacts::Result<()> {
    env_logger::init();

    let mut collector = Collector::open()?;

    println!("FQDN: {}", collector.fqdn(256)?);
    println!("PID:  {}", collector.pid());

    println!("\nNetwork interfaces:");
    for name in &collector.net_interface_list()? {
        match collector.net_interface_config(name) {
            Ok(config) => print!("{config}"),
            Err(e) => println!("{name}: {e} ({})", hostfacts::strerror(e.code())),
        }
    }

    println!("\nRoutes:");
    for route in &collector.net_route_list()? {
        println!("  {route}");
    }

    println!("\nListening sockets:");
    let filter = ConnectionFilter::default().server(true).tcp(true).udp(true);
    for conn in &collector.net_connection_list(filter)? {
        println!(
            "  {:<4} {}:{} {}",
            conn.connection_type, conn.local_address, conn.local_port, conn.state
        );
    }

    println!("\nFile systems:");
    for fs in &collector.file_system_list()? {
        println!("  {:<24} {:<10} {}", fs.dir_name, fs.sys_type_name, fs.fs_type);
    }

    println!("\nCPUs:");
    for (i, cpu) in collector.cpu_list()?.iter().enumerate() {
        let busy = cpu.total - cpu.idle;
        println!("  cpu{i}: {} busy of {} total ms", busy, cpu.total);
    }
    for info in &collector.cpu_info_list()? {
        println!("  {} {} @ {} MHz", info.vendor, info.model, info.mhz);
    }

    println!("\nProcesses: {}", collector.proc_list()?.len());

    println!("\nUsers:");
    for who in &collector.who_list()? {
        println!("  {:<12} {:<8} {}", who.user, who.device, who.host);
    }

    println!("\nResource limits:");
    let limits = collector.resource_limit()?;
    print!("{limits}");
    if let Some(stack) = limits.stack.cur.value() {
        println!("stack: {}", format_size(stack));
    }

    Ok(())
}
