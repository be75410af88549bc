fn main() {
    pdf_rows_lib::run()
}
